use beelink_transport::ByteSource;
use tracing::{debug, trace};

use crate::checksum::Checksum;
use crate::error::Result;
use crate::escape::{DELIMITER, ESCAPE, ESCAPE_MASK};
use crate::frame::{dispatch, FrameView};

/// Size of the reassembly buffer, delimiter through checksum.
///
/// The largest frame that fits declares a length of `FRAME_CAPACITY - 4`.
pub const FRAME_CAPACITY: usize = 255;

/// Handler invoked once per delivered frame.
pub type FrameCallback = Box<dyn FnMut(&FrameView<'_>) + Send>;

/// Counters kept across packets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecoderStats {
    /// Checksum-valid frames handed to the callback (or returned by `push`).
    pub frames_delivered: u64,
    /// Frames dropped because the checksum byte did not match.
    pub checksum_failures: u64,
    /// Checksum-valid frames of a type that is not dispatched, or too short
    /// for their type.
    pub frames_ignored: u64,
    /// Packets whose declared length did not fit the buffer.
    pub overflows: u64,
}

/// The single in-flight packet.
struct Packet {
    /// Structural bytes consumed since the last delimiter.
    offset: usize,
    /// Declared length plus three; the index of the checksum byte.
    size: usize,
    length_high: u8,
    checksum: Checksum,
    escaped: bool,
    /// Set once the checksum byte has been seen or the length overflowed.
    finished: bool,
    buffer: [u8; FRAME_CAPACITY],
}

impl Packet {
    fn new() -> Self {
        Self {
            offset: 0,
            size: 0,
            length_high: 0,
            checksum: Checksum::new(),
            escaped: false,
            finished: false,
            buffer: [0; FRAME_CAPACITY],
        }
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.size = 0;
        self.length_high = 0;
        self.checksum.reset();
        self.escaped = false;
        self.finished = false;
        self.buffer.fill(0);
    }
}

/// Byte-at-a-time API frame decoder.
///
/// Feed it raw bytes from the radio. A `0x7E` delimiter anywhere restarts
/// reassembly; partial frames are never resumed. When the checksum byte of a
/// packet arrives and matches, the frame is dispatched: the registered
/// callback receives a [`FrameView`] borrowing the internal buffer.
/// Corrupt frames and frame types outside the dispatched set are dropped
/// silently.
///
/// Every byte after the delimiter is unescaped, the two length bytes
/// included. A frame written without escaping whose declared length is a
/// reserved value (0x7D for a 111-byte transmit payload, for instance) is
/// therefore not decodable here.
pub struct FrameDecoder {
    packet: Packet,
    callback: Option<FrameCallback>,
    stats: DecoderStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            packet: Packet::new(),
            callback: None,
            stats: DecoderStats::default(),
        }
    }

    /// Register the frame handler, replacing any previous one.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&FrameView<'_>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Poll `source` once.
    ///
    /// Returns `Ok(false)` without doing anything when no byte is available,
    /// otherwise consumes exactly one byte and returns `Ok(true)`.
    pub fn tick<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<bool> {
        if source.bytes_available()? == 0 {
            return Ok(false);
        }
        match source.read_byte()? {
            Some(byte) => {
                self.feed(byte);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Process one raw byte, invoking the callback if it completes a frame.
    pub fn feed(&mut self, byte: u8) {
        let Some(size) = self.advance(byte) else {
            return;
        };
        match dispatch(&self.packet.buffer, size) {
            Some(view) => {
                self.stats.frames_delivered += 1;
                trace!(
                    frame_type = view.frame_type().name(),
                    payload = view.payload().len(),
                    "frame delivered"
                );
                if let Some(callback) = self.callback.as_mut() {
                    callback(&view);
                }
            }
            None => self.stats.frames_ignored += 1,
        }
    }

    /// Process a run of raw bytes through [`feed`](Self::feed).
    pub fn feed_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.feed(byte);
        }
    }

    /// Process one raw byte and return the completed frame, if any.
    ///
    /// The callback is not invoked. The returned view borrows the decoder, so
    /// it has to be dropped before the next byte goes in.
    pub fn push(&mut self, byte: u8) -> Option<FrameView<'_>> {
        let size = self.advance(byte)?;
        let view = dispatch(&self.packet.buffer, size);
        if view.is_some() {
            self.stats.frames_delivered += 1;
        } else {
            self.stats.frames_ignored += 1;
        }
        view
    }

    /// Structural bytes consumed since the last delimiter.
    pub fn offset(&self) -> usize {
        self.packet.offset
    }

    /// Declared length plus three, or zero before the length is known.
    pub fn declared_size(&self) -> usize {
        self.packet.size
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Run the state machine for one byte. Returns the checksum index of a
    /// frame whose checksum just verified.
    fn advance(&mut self, mut byte: u8) -> Option<usize> {
        let packet = &mut self.packet;

        if byte == DELIMITER {
            packet.reset();
            return None;
        }
        if packet.finished {
            return None;
        }

        if packet.escaped {
            packet.escaped = false;
            byte ^= ESCAPE_MASK;
        } else if byte == ESCAPE {
            packet.escaped = true;
            return None;
        }

        packet.offset += 1;
        match packet.offset {
            1 => {
                packet.length_high = byte;
                return None;
            }
            2 => {
                let declared = u16::from_be_bytes([packet.length_high, byte]) as usize;
                packet.size = declared + 3;
                if packet.size >= FRAME_CAPACITY {
                    debug!(declared, capacity = FRAME_CAPACITY, "declared length overflows buffer");
                    self.stats.overflows += 1;
                    packet.finished = true;
                    return None;
                }
                packet.buffer[0] = DELIMITER;
                packet.buffer[1] = packet.length_high;
                packet.buffer[2] = byte;
                return None;
            }
            _ => {}
        }

        packet.buffer[packet.offset] = byte;

        if packet.offset == packet.size {
            packet.finished = true;
            if packet.checksum.verify(byte) {
                return Some(packet.size);
            }
            debug!(
                expected = packet.checksum.finish(),
                received = byte,
                "checksum mismatch, dropping frame"
            );
            self.stats.checksum_failures += 1;
            return None;
        }

        packet.checksum.push(byte);
        None
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("offset", &self.packet.offset)
            .field("size", &self.packet.size)
            .field("escaped", &self.packet.escaped)
            .field("finished", &self.packet.finished)
            .field("callback", &self.callback.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}
