//! Frame checksum.
//!
//! The checksum covers every logical (unescaped) byte from the frame type up
//! to, but not including, the checksum byte itself: `0xFF - (sum & 0xFF)`.

/// Index of the first checksummed byte (the frame type).
pub const CHECKSUM_START: usize = 3;

/// Checksum of `buf[3..len]`.
///
/// `len` is the index of the checksum byte, so a complete frame buffer
/// satisfies `checksum(buf, len) == buf[len]`. Lengths below 3 cover nothing
/// and yield `0xFF`; `len` is clamped to the buffer.
pub fn checksum(buf: &[u8], len: usize) -> u8 {
    let end = len.min(buf.len());
    let mut sum = Checksum::new();
    if end > CHECKSUM_START {
        sum.update(&buf[CHECKSUM_START..end]);
    }
    sum.finish()
}

/// Incremental checksum for streamed encoding and byte-at-a-time decoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Checksum {
    sum: u8,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) {
        self.sum = self.sum.wrapping_add(byte);
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// The checksum byte for everything pushed so far.
    pub fn finish(&self) -> u8 {
        0xFF - self.sum
    }

    /// Whether `received` is the correct checksum byte.
    pub fn verify(&self, received: u8) -> bool {
        self.finish() == received
    }

    pub fn reset(&mut self) {
        self.sum = 0;
    }
}
