use std::collections::VecDeque;

use crate::error::Result;
use crate::traits::{ByteSink, ByteSource};

/// In-memory port: a receive queue fed by the caller and a transmit log.
#[derive(Debug, Default, Clone)]
pub struct MemoryPort {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if they had arrived from the radio.
    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Everything written so far.
    pub fn tx(&self) -> &[u8] {
        &self.tx
    }

    /// Take the transmit log, leaving it empty.
    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }

    /// Move everything transmitted into the receive queue.
    pub fn loop_back(&mut self) {
        let tx = self.take_tx();
        self.rx.extend(tx);
    }
}

impl ByteSource for MemoryPort {
    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.rx.pop_front())
    }
}

impl ByteSink for MemoryPort {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.tx.push(byte);
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.tx.extend_from_slice(bytes);
        Ok(())
    }
}
