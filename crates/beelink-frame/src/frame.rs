use bytes::Bytes;
use tracing::debug;

use crate::frame_type::{frame_type_name, FrameType};

/// Offset of the frame type byte.
pub const FRAME_TYPE_OFFSET: usize = 3;

const SOURCE64_OFFSET: usize = 4;
const SOURCE16_OFFSET: usize = 12;
const AT_RESPONSE_PAYLOAD: usize = 5;
const RECEIVE_PACKET_PAYLOAD: usize = 15;
const EXPLICIT_RX_PAYLOAD: usize = 21;

/// A validated inbound frame, borrowed from the decoder's buffer.
///
/// The view only lives for the duration of a callback (or until the next
/// byte is pushed into the decoder). Use [`to_owned_frame`](Self::to_owned_frame)
/// to keep it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameView<'a> {
    frame: &'a [u8],
    frame_type: FrameType,
    source64: Option<u64>,
    source16: Option<u16>,
    payload: &'a [u8],
}

impl<'a> FrameView<'a> {
    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    /// 64-bit source address in host order, for receive frames.
    pub fn source_addr64(&self) -> Option<u64> {
        self.source64
    }

    /// 16-bit source network address in host order, for receive frames.
    pub fn source_addr16(&self) -> Option<u16> {
        self.source16
    }

    /// Type-specific data.
    ///
    /// For AT command responses this starts at the two command characters,
    /// followed by the status byte and any returned value.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Index of the checksum byte; the declared length plus three.
    pub fn packet_length(&self) -> usize {
        self.frame.len() - 1
    }

    /// The whole unescaped frame, delimiter through checksum.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.frame
    }

    /// Frame id of an AT command response.
    pub fn frame_id(&self) -> Option<u8> {
        match self.frame_type {
            FrameType::AtCommandResponse => Some(self.frame[4]),
            _ => None,
        }
    }

    /// Copy the view out so it can outlive the decoder borrow.
    pub fn to_owned_frame(&self) -> ApiFrame {
        ApiFrame {
            frame_type: self.frame_type,
            frame_id: self.frame_id(),
            source64: self.source64,
            source16: self.source16,
            payload: Bytes::copy_from_slice(self.payload),
        }
    }
}

/// Owned copy of a [`FrameView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFrame {
    pub frame_type: FrameType,
    pub frame_id: Option<u8>,
    pub source64: Option<u64>,
    pub source16: Option<u16>,
    pub payload: Bytes,
}

/// Build the view for a completed, checksum-valid frame buffer.
///
/// `size` is the index of the checksum byte. Returns `None` for frame types
/// outside the dispatched set and for frames too short to hold their fixed
/// fields.
pub fn dispatch(buf: &[u8], size: usize) -> Option<FrameView<'_>> {
    if size <= FRAME_TYPE_OFFSET || size >= buf.len() {
        return None;
    }
    let type_byte = buf[FRAME_TYPE_OFFSET];
    let frame_type = match FrameType::from_byte(type_byte) {
        Some(ty) if ty.is_dispatched() => ty,
        _ => {
            debug!(
                frame_type = type_byte,
                name = frame_type_name(type_byte),
                "ignoring frame type"
            );
            return None;
        }
    };

    let (payload_start, addressed) = match frame_type {
        FrameType::AtCommandResponse => (AT_RESPONSE_PAYLOAD, false),
        FrameType::ReceivePacket => (RECEIVE_PACKET_PAYLOAD, true),
        FrameType::ExplicitRxIndicator => (EXPLICIT_RX_PAYLOAD, true),
        _ => return None,
    };

    if size < payload_start {
        debug!(
            name = frame_type.name(),
            size, payload_start, "frame too short for its type"
        );
        return None;
    }

    let (source64, source16) = if addressed {
        let mut addr64 = [0u8; 8];
        addr64.copy_from_slice(&buf[SOURCE64_OFFSET..SOURCE64_OFFSET + 8]);
        let addr16 = [buf[SOURCE16_OFFSET], buf[SOURCE16_OFFSET + 1]];
        (
            Some(u64::from_be_bytes(addr64)),
            Some(u16::from_be_bytes(addr16)),
        )
    } else {
        (None, None)
    };

    Some(FrameView {
        frame: &buf[..=size],
        frame_type,
        source64,
        source16,
        payload: &buf[payload_start..size],
    })
}
