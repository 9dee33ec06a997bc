//! Byte-stuffing.
//!
//! Reserved values after the start delimiter are sent as [`ESCAPE`] followed
//! by the value XORed with [`ESCAPE_MASK`].

use beelink_transport::ByteSink;

/// Start-of-frame delimiter.
pub const DELIMITER: u8 = 0x7E;
/// Escape marker.
pub const ESCAPE: u8 = 0x7D;
/// Software flow control: resume.
pub const XON: u8 = 0x11;
/// Software flow control: pause.
pub const XOFF: u8 = 0x13;
/// Applied to the byte following [`ESCAPE`].
pub const ESCAPE_MASK: u8 = 0x20;

/// Returns true if `byte` must be escaped on the wire.
pub fn needs_escape(byte: u8) -> bool {
    matches!(byte, DELIMITER | ESCAPE | XON | XOFF)
}

/// Append the wire form of a logical frame to `dst`.
///
/// `frame[0]` is taken to be the delimiter and goes out as-is; every later
/// byte is stuffed when reserved.
pub fn escape_into(frame: &[u8], dst: &mut bytes::BytesMut) {
    let Some((&first, rest)) = frame.split_first() else {
        return;
    };
    dst.reserve(frame.len() + frame.len() / 4);
    dst.extend_from_slice(&[first]);
    for &byte in rest {
        if needs_escape(byte) {
            dst.extend_from_slice(&[ESCAPE, byte ^ ESCAPE_MASK]);
        } else {
            dst.extend_from_slice(&[byte]);
        }
    }
}

/// Write one logical byte, stuffing it when reserved.
pub(crate) fn write_escaped<S: ByteSink + ?Sized>(
    sink: &mut S,
    byte: u8,
) -> beelink_transport::Result<()> {
    if needs_escape(byte) {
        sink.write_byte(ESCAPE)?;
        sink.write_byte(byte ^ ESCAPE_MASK)
    } else {
        sink.write_byte(byte)
    }
}
