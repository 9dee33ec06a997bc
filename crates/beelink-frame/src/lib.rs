//! API frame codec for XBee-style radio modules.
//!
//! This is the core of beelink. Every frame on the wire looks like:
//! - a `0x7E` start delimiter
//! - a 2-byte big-endian length covering frame type through payload
//! - the frame type byte and its type-specific fields
//! - a one-byte checksum
//!
//! Every byte after the delimiter that collides with a reserved value is
//! byte-stuffed. The decoder takes one byte at a time and hands each
//! checksum-valid frame to a single registered callback; the encoders build
//! AT command and transmit request frames.

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod escape;
pub mod frame;
pub mod frame_type;
pub mod link;

#[cfg(feature = "async")]
pub mod codec;

pub use checksum::{checksum, Checksum};
pub use decoder::{DecoderStats, FrameDecoder, FRAME_CAPACITY};
pub use encoder::{
    encode_local_at, encode_transmit_raw, write_transmit_escaped, AtCommand, TransmitHeader,
    MAX_AT_PARAMS,
};
pub use error::{FrameError, Result};
pub use escape::{escape_into, needs_escape, DELIMITER, ESCAPE, ESCAPE_MASK, XOFF, XON};
pub use frame::{dispatch, ApiFrame, FrameView};
pub use frame_type::{frame_type_name, FrameType};
pub use link::{ApiLink, LinkConfig, DEFAULT_DEST_ADDR64};

#[cfg(feature = "async")]
pub use codec::{ApiFrameCodec, OutboundFrame};
