//! `tokio_util::codec` adapter (requires the `async` feature).
//!
//! Wraps the byte-at-a-time [`FrameDecoder`] so a serial stream can be
//! driven with `FramedRead` / `FramedWrite`. Decoded frames are copied out
//! as owned [`ApiFrame`]s; the callback slot is not used.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::decoder::FrameDecoder;
use crate::encoder::{encode_local_at, write_transmit_escaped, AtCommand, TransmitHeader};
use crate::error::FrameError;
use crate::escape::escape_into;
use crate::frame::ApiFrame;
use crate::link::next_frame_id;

/// Frames the codec can put on the wire. Both are escaped.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    /// Local AT command; the codec assigns the frame id.
    LocalAt { command: AtCommand, params: Bytes },
    /// Transmit request.
    Transmit {
        header: TransmitHeader,
        payload: Bytes,
    },
}

/// Async codec for API frames.
#[derive(Debug)]
pub struct ApiFrameCodec {
    decoder: FrameDecoder,
    frame_id: u8,
}

impl ApiFrameCodec {
    pub fn new() -> Self {
        Self {
            decoder: FrameDecoder::new(),
            frame_id: 1,
        }
    }

    /// Frame id the next AT command will carry.
    pub fn frame_id(&self) -> u8 {
        self.frame_id
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }
}

impl Default for ApiFrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ApiFrameCodec {
    type Item = ApiFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            let byte = src.get_u8();
            if let Some(view) = self.decoder.push(byte) {
                return Ok(Some(view.to_owned_frame()));
            }
        }
        Ok(None)
    }
}

impl Encoder<OutboundFrame> for ApiFrameCodec {
    type Error = FrameError;

    /// # Panics
    ///
    /// Panics on AT parameters longer than
    /// [`MAX_AT_PARAMS`](crate::encoder::MAX_AT_PARAMS).
    fn encode(&mut self, item: OutboundFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            OutboundFrame::LocalAt { command, params } => {
                let frame = encode_local_at(self.frame_id, command, &params);
                escape_into(&frame, dst);
                self.frame_id = next_frame_id(self.frame_id);
            }
            OutboundFrame::Transmit { header, payload } => {
                write_transmit_escaped(dst, &header, &payload)?;
            }
        }
        Ok(())
    }
}
