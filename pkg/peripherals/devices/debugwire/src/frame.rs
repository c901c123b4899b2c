use common::errors::*;

use crate::adapter::{AdapterTransport, STATE_SEND, STATE_SEND_CAPTURE, STATE_SEND_READ, STATE_SEND_WAIT};
use crate::error::Error;
use crate::port::UsbPort;

/// Maximum number of bytes this buffer will coalesce before an implicit
/// flush.
const OUT_BUF_CAPACITY: usize = 128;

/// Write-coalescing buffer sitting between the command encoder and the
/// adapter transport.
///
/// Invariant upheld here: every read transaction is preceded by at least
/// one outgoing byte in the same state-tagged transfer —
/// `receive` always flushes with `STATE_SEND_READ` before issuing any IN
/// transfer.
pub struct FrameBuffer<P: UsbPort> {
    adapter: AdapterTransport<P>,
    out_buf: Vec<u8>,
}

impl<P: UsbPort> FrameBuffer<P> {
    pub fn new(adapter: AdapterTransport<P>) -> Self {
        Self {
            adapter,
            out_buf: Vec::with_capacity(OUT_BUF_CAPACITY),
        }
    }

    pub fn adapter(&mut self) -> &mut AdapterTransport<P> {
        &mut self.adapter
    }

    /// Appends `bytes` to the coalescing buffer, flushing eagerly (as a
    /// plain send) whenever it would otherwise exceed 128 bytes.
    pub fn push(&mut self, bytes: &[u8]) -> Result<()> {
        for chunk in bytes {
            if self.out_buf.len() >= OUT_BUF_CAPACITY {
                self.flush(STATE_SEND)?;
            }
            self.out_buf.push(*chunk);
        }

        if self.out_buf.len() > OUT_BUF_CAPACITY {
            return Err(Error::Protocol("out_buf exceeded 128 bytes".to_string()).into());
        }

        Ok(())
    }

    /// Sends the accumulated bytes tagged with `state`, then clears the
    /// buffer. Does nothing if the buffer is empty.
    pub fn flush(&mut self, state: u8) -> Result<()> {
        if self.out_buf.is_empty() {
            return Ok(());
        }

        let data = std::mem::take(&mut self.out_buf);
        self.adapter.send(state, &data)
    }

    /// Stages any buffered bytes together with a pending read,
    /// then polls until `n` bytes arrive, filling `out`.
    pub fn receive(&mut self, n: usize) -> Result<Vec<u8>> {
        self.flush(STATE_SEND_READ)?;

        let mut out = vec![0u8; n];
        let mut received = 0;
        while received < n {
            let got = self.adapter.read(&mut out[received..])?;
            if got == 0 {
                continue;
            }
            received += got;
        }

        Ok(out)
    }

    /// Flushes tagged for pulse capture, then recalibrates the adapter's
    /// baud from the resulting `0x55` sync pulses.
    pub fn sync(&mut self) -> Result<()> {
        self.flush(STATE_SEND_CAPTURE)?;
        self.adapter.set_baud()
    }

    /// Flushes tagged "send + wait": the adapter sends the buffered bytes
    /// and then polls the wire for a level transition (used after `go`).
    pub fn wait(&mut self) -> Result<()> {
        self.flush(STATE_SEND_WAIT)
    }

    pub fn close(&mut self) -> Result<()> {
        self.adapter.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterTransport;
    use crate::test_support::MockPort;

    fn buffer() -> FrameBuffer<MockPort> {
        FrameBuffer::new(AdapterTransport::new(MockPort::new()))
    }

    #[test]
    fn push_flushes_eagerly_past_128_bytes() {
        let mut fb = buffer();
        fb.push(&vec![0xAAu8; 130]).unwrap();
        fb.flush(STATE_SEND).unwrap();

        // One eager flush at 128 bytes, then one explicit flush of the
        // remaining 2 bytes.
        assert_eq!(fb.adapter.port.sent.len(), 2);
        assert_eq!(fb.adapter.port.sent[0].1.len(), 128);
        assert_eq!(fb.adapter.port.sent[1].1.len(), 2);
    }

    #[test]
    fn flush_of_empty_buffer_issues_no_transfer() {
        let mut fb = buffer();
        fb.flush(STATE_SEND).unwrap();
        assert!(fb.adapter.port.sent.is_empty());
    }

    #[test]
    fn receive_bundles_a_send_before_the_read() {
        let mut fb = buffer();
        fb.adapter.port.queue_raw(vec![1, 2, 3]);

        fb.push(&[0xD0, 0x00, 0x20]).unwrap();
        let data = fb.receive(3).unwrap();

        assert_eq!(data, vec![1, 2, 3]);
        assert_eq!(fb.adapter.port.sent_states(), vec![STATE_SEND_READ]);
    }

    #[test]
    fn receive_accumulates_across_short_reads() {
        let mut fb = buffer();
        fb.adapter.port.queue_raw(vec![1, 2]);
        fb.adapter.port.queue_raw(vec![3]);

        let data = fb.receive(3).unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }
}
