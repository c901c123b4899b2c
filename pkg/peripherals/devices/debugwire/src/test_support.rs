//! A `UsbPort` double used by every module's own test suite.

use std::collections::VecDeque;

use common::errors::*;

use crate::port::UsbPort;

pub struct MockPort {
    pub sent: Vec<(u8, Vec<u8>)>,
    responses: VecDeque<Vec<u8>>,
    bit_times: Vec<u8>,
}

impl MockPort {
    pub fn new() -> Self {
        Self {
            sent: vec![],
            responses: VecDeque::new(),
            bit_times: vec![],
        }
    }

    /// Queues the bytes returned by the next `control_in` call.
    pub fn queue_raw(&mut self, bytes: Vec<u8>) {
        self.responses.push_back(bytes);
    }

    /// Queues a capture-buffer response built from pulse-width samples.
    pub fn queue_capture(&mut self, samples: impl IntoIterator<Item = u16>) {
        let mut bytes = vec![];
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        self.queue_raw(bytes);
    }

    pub fn last_bit_time(&self) -> Option<u8> {
        self.bit_times.last().copied()
    }

    /// The `state` byte of every `control_out` call, in order.
    pub fn sent_states(&self) -> Vec<u8> {
        self.sent.iter().map(|(s, _)| *s).collect()
    }
}

impl UsbPort for MockPort {
    fn control_out(&mut self, state: u8, data: &[u8]) -> Result<()> {
        self.sent.push((state, data.to_vec()));
        Ok(())
    }

    fn control_in(&mut self, buf: &mut [u8]) -> Result<usize> {
        let resp = match self.responses.pop_front() {
            Some(r) => r,
            None => return Ok(0),
        };

        let n = resp.len().min(buf.len());
        buf[..n].copy_from_slice(&resp[..n]);
        Ok(n)
    }

    fn set_timing(&mut self, bit_time: u8) -> Result<()> {
        self.bit_times.push(bit_time);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
