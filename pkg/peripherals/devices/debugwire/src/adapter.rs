use std::thread::sleep;
use std::time::Duration;

use common::errors::*;

use crate::backoff;
use crate::error::Error;
use crate::port::UsbPort;

/// Bits of the adapter's USB command-state byte. This is the
/// `wValue` of every control transfer sent to the gateway; it tells the
/// firmware which of its six phases to run for this transaction.
pub const SEND_BREAK: u8 = 0x01;
pub const SET_TIMING: u8 = 0x02;
pub const SEND_BYTES: u8 = 0x04;
pub const WAIT_FOR_START: u8 = 0x08;
pub const READ_BYTES: u8 = 0x10;
pub const RECORD_PULSES: u8 = 0x20;

/// Every combination of the above bits this crate ever sends.
pub const STATE_BREAK_CAPTURE: u8 = SEND_BREAK | RECORD_PULSES; // 0x21
pub const STATE_SEND: u8 = SEND_BYTES; // 0x04
pub const STATE_SEND_READ: u8 = SEND_BYTES | READ_BYTES; // 0x14
pub const STATE_SEND_WAIT_READ: u8 = SEND_BYTES | WAIT_FOR_START | READ_BYTES; // 0x1C
pub const STATE_SEND_CAPTURE: u8 = SEND_BYTES | RECORD_PULSES; // 0x24
pub const STATE_SEND_WAIT: u8 = SEND_BYTES | WAIT_FOR_START; // 0x0C

const BYTE_RETRY_ATTEMPTS: u32 = 50;
const BYTE_RETRY_DELAY: Duration = Duration::from_millis(20);
const SEND_QUIESCENT_DELAY: Duration = Duration::from_millis(3);

const CALIBRATION_RETRY_ATTEMPTS: u32 = 5;
const CALIBRATION_RETRY_DELAY: Duration = Duration::from_millis(20);

const BREAK_RETRY_ATTEMPTS: u32 = 25;
const BREAK_WAIT: Duration = Duration::from_millis(120);

/// The adapter's own clock, used to convert a measured cycles-per-pulse into
/// a baud rate for reporting.
const ADAPTER_CLOCK_HZ: u64 = 16_500_000;

/// Capacity of the adapter's capture buffer: up to 64 `u16` pulse widths.
const CAPTURE_BUFFER_CAPACITY: usize = 64;
/// Minimum bytes a capture read must return to be usable — 9 samples' worth.
const CAPTURE_MIN_BYTES: usize = CALIBRATION_SAMPLE_COUNT * 2;
/// How many of the trailing samples are trustworthy; earlier ones include
/// break-edge artefacts.
const CALIBRATION_SAMPLE_COUNT: usize = 9;

/// Retried USB control-transfer plumbing to the LittleWire/Digispark
/// gateway, plus break-pulse baud calibration.
///
/// This owns nothing about the debugWIRE wire protocol itself (that's the
/// command encoder's job) — it only knows how to get bytes to and from the
/// adapter reliably, and how to recover the target's bit-time from a batch
/// of captured pulse widths.
pub struct AdapterTransport<P: UsbPort> {
    pub(crate) port: P,
    cycles_per_pulse: u32,
}

impl<P: UsbPort> AdapterTransport<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            cycles_per_pulse: 0,
        }
    }

    pub fn cycles_per_pulse(&self) -> u32 {
        self.cycles_per_pulse
    }

    /// Sends `data` tagged with `state`, retrying USB failures up to 50
    /// times 20ms apart, and waiting 3ms afterwards for the adapter to
    /// drain the previous debugWIRE activity.
    pub fn send(&mut self, state: u8, data: &[u8]) -> Result<()> {
        let port = &mut self.port;
        backoff::retry(BYTE_RETRY_ATTEMPTS, BYTE_RETRY_DELAY, || {
            port.control_out(state, data)
        })?;
        sleep(SEND_QUIESCENT_DELAY);
        Ok(())
    }

    /// Reads back up to `buf.len()` bytes, retrying USB failures up to 50
    /// times 20ms apart. Returns the number of bytes actually received.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let port = &mut self.port;
        backoff::retry(BYTE_RETRY_ATTEMPTS, BYTE_RETRY_DELAY, || port.control_in(buf))
    }

    pub fn set_timing(&mut self, bit_time: u8) -> Result<()> {
        let port = &mut self.port;
        backoff::retry(BYTE_RETRY_ATTEMPTS, BYTE_RETRY_DELAY, || {
            port.set_timing(bit_time)
        })
    }

    pub fn close(&mut self) -> Result<()> {
        self.port.close()
    }

    /// Reads the adapter's capture buffer, computes cycles-per-pulse from
    /// the last 9 samples, and programs the adapter's bit-timing register
    ///.
    pub fn set_baud(&mut self) -> Result<()> {
        let mut raw = [0u8; CAPTURE_BUFFER_CAPACITY * 2];
        let n = self.read(&mut raw)?;

        if n < CAPTURE_MIN_BYTES {
            return Err(Error::Calibration(format!(
                "Expected at least {} bytes of pulse samples, got {}",
                CAPTURE_MIN_BYTES, n
            ))
            .into());
        }

        let samples: Vec<u16> = raw[..n]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();

        // Only the last 9 samples are trustworthy; earlier ones include
        // break-edge artefacts.
        let last_nine = &samples[samples.len() - CALIBRATION_SAMPLE_COUNT..];
        let sum: u64 = last_nine.iter().map(|&v| v as u64).sum();

        let cpp = ((6 * sum) / (CALIBRATION_SAMPLE_COUNT as u64) + 8) as u32;
        self.cycles_per_pulse = cpp;

        let bit_time = ((cpp - 8) / 4) as u8;
        self.set_timing(bit_time)?;

        Ok(())
    }

    /// Repeatedly sends a break pulse and waits for the target's `0x55`
    /// sync pulses, recalibrating baud on each attempt, until one succeeds
    /// or 25 attempts are exhausted. Returns
    /// the measured baud rate in bits per second.
    pub fn break_and_sync(&mut self) -> Result<u32> {
        for attempt in 0..BREAK_RETRY_ATTEMPTS {
            let outcome = self.try_break_and_sync();
            match outcome {
                Ok(()) => {
                    return Ok((ADAPTER_CLOCK_HZ / self.cycles_per_pulse as u64) as u32);
                }
                Err(_) if attempt + 1 < BREAK_RETRY_ATTEMPTS => continue,
                Err(e) => return Err(e),
            }
        }

        Err(Error::Calibration("Exhausted break+sync retries".to_string()).into())
    }

    fn try_break_and_sync(&mut self) -> Result<()> {
        let port = &mut self.port;
        backoff::retry(BYTE_RETRY_ATTEMPTS, BYTE_RETRY_DELAY, || {
            port.control_out(STATE_BREAK_CAPTURE, &[])
        })?;

        sleep(BREAK_WAIT);

        backoff::retry(CALIBRATION_RETRY_ATTEMPTS, CALIBRATION_RETRY_DELAY, || {
            self.set_baud()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockPort;

    #[test]
    fn set_baud_computes_cycles_per_pulse_and_bit_time() {
        let mut port = MockPort::new();
        port.queue_capture([100u16; CALIBRATION_SAMPLE_COUNT]);

        let mut transport = AdapterTransport::new(port);
        transport.set_baud().unwrap();

        // cpp = (6 * 900) / 9 + 8 = 608
        assert_eq!(transport.cycles_per_pulse(), 608);
        assert_eq!(transport.port.last_bit_time(), Some((608 - 8) / 4));
    }

    /// A capture with more than 9 samples still only uses the trailing 9 —
    /// the capture shape allows up to 64 `u16` pulse widths, not exactly 9.
    #[test]
    fn set_baud_uses_only_the_trailing_nine_samples_of_a_longer_capture() {
        let mut port = MockPort::new();
        let mut samples = vec![9999u16; 9];
        samples.extend([100u16; CALIBRATION_SAMPLE_COUNT]);
        port.queue_capture(samples);

        let mut transport = AdapterTransport::new(port);
        transport.set_baud().unwrap();

        assert_eq!(transport.cycles_per_pulse(), 608);
    }

    #[test]
    fn set_baud_fails_on_short_capture() {
        let mut port = MockPort::new();
        port.queue_raw(vec![0u8; 4]);

        let mut transport = AdapterTransport::new(port);
        assert!(transport.set_baud().is_err());
    }

    /// The documented floor is 18 bytes (9 `u16` samples); calibration must
    /// succeed exactly at that floor, not silently require more.
    #[test]
    fn set_baud_succeeds_at_exactly_the_eighteen_byte_floor() {
        let mut port = MockPort::new();
        port.queue_capture([100u16; CALIBRATION_SAMPLE_COUNT]);

        let mut transport = AdapterTransport::new(port);
        assert!(transport.set_baud().is_ok());
    }

    /// P5: `bit_time = (cpp - 8) / 4` recovers `cpp` within ±4 cycles, and
    /// is monotone non-decreasing in `cpp` over the range plausible bit
    /// times can take.
    #[test]
    fn bit_time_round_trip_recovers_cycles_per_pulse_within_four() {
        let mut last_bit_time = None;
        let mut cpp = 8u32;
        while cpp < 4096 {
            let bit_time = (cpp - 8) / 4;
            let recovered_cpp = (bit_time as u32) * 4 + 8;
            assert!((recovered_cpp as i64 - cpp as i64).abs() <= 4);

            if let Some(prev) = last_bit_time {
                assert!(bit_time >= prev);
            }
            last_bit_time = Some(bit_time);
            cpp += 1;
        }
    }

    /// Scenario 6: a capture buffer that never returns enough samples
    /// exhausts all 25 break+sync retries before surfacing a fatal
    /// `calibration` error.
    #[test]
    fn break_and_sync_exhausts_retries_on_persistently_short_capture() {
        let mut port = MockPort::new();
        for _ in 0..(BREAK_RETRY_ATTEMPTS * CALIBRATION_RETRY_ATTEMPTS) {
            port.queue_raw(vec![0u8; 4]);
        }

        let mut transport = AdapterTransport::new(port);
        let err = transport.break_and_sync();
        assert!(err.is_err());
    }
}
