use beelink_transport::ByteSink;
use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::checksum::{checksum, Checksum};
use crate::error::{FrameError, Result};
use crate::escape::{write_escaped, DELIMITER};
use crate::frame_type::FrameType;

/// Two-character AT command code, e.g. `*b"NI"`.
pub type AtCommand = [u8; 2];

/// Largest parameter block a local AT command frame carries.
pub const MAX_AT_PARAMS: usize = AT_FRAME_BUFFER - AT_FIXED_LEN;

const AT_FRAME_BUFFER: usize = 32;
/// Delimiter, length (2), type, frame id, command (2), checksum.
const AT_FIXED_LEN: usize = 8;

/// Delimiter through transmit options.
pub const TRANSMIT_HEADER_LEN: usize = 17;

/// Largest payload whose declared length still fits in 16 bits.
pub const MAX_TRANSMIT_PAYLOAD: usize = u16::MAX as usize - (TRANSMIT_HEADER_LEN - 3);

/// Build a local AT command frame.
///
/// The returned bytes are the logical frame, unescaped; run them through
/// [`escape_into`](crate::escape::escape_into) before they go on the wire.
///
/// # Panics
///
/// Panics if `params` is longer than [`MAX_AT_PARAMS`]. That is a caller
/// bug, not a runtime condition.
pub fn encode_local_at(frame_id: u8, command: AtCommand, params: &[u8]) -> BytesMut {
    assert!(
        params.len() <= MAX_AT_PARAMS,
        "AT command parameters too long ({} bytes, max {MAX_AT_PARAMS})",
        params.len()
    );

    let mut frame = BytesMut::with_capacity(AT_FIXED_LEN + params.len());
    frame.put_u8(DELIMITER);
    frame.put_u16((4 + params.len()) as u16);
    frame.put_u8(FrameType::AtCommand.as_byte());
    frame.put_u8(frame_id);
    frame.put_slice(&command);
    frame.put_slice(params);
    let sum = checksum(&frame, frame.len());
    frame.put_u8(sum);
    frame
}

/// Addressing fields of a transmit request (frame type 0x10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitHeader {
    /// Zero asks the radio not to send a transmit status.
    pub frame_id: u8,
    pub dest64: u64,
    pub dest16: u16,
    pub broadcast_radius: u8,
    pub options: u8,
}

impl TransmitHeader {
    /// 16-bit address meaning "unknown, resolve from the 64-bit address".
    pub const UNKNOWN_ADDR16: u16 = 0xFFFE;

    /// Header used by the buffered, unescaped send path.
    pub fn raw(dest64: u64) -> Self {
        Self {
            frame_id: 0x01,
            dest64,
            dest16: Self::UNKNOWN_ADDR16,
            broadcast_radius: 0x00,
            options: 0x00,
        }
    }

    /// Header used by the streamed, escaped send path. Frame id 0 disables
    /// the transmit status reply.
    pub fn streamed(dest64: u64) -> Self {
        Self {
            frame_id: 0x00,
            dest64,
            dest16: Self::UNKNOWN_ADDR16,
            broadcast_radius: 0x01,
            options: 0x01,
        }
    }

    fn to_bytes(self, payload_len: usize) -> Result<[u8; TRANSMIT_HEADER_LEN]> {
        if payload_len > MAX_TRANSMIT_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload_len,
                max: MAX_TRANSMIT_PAYLOAD,
            });
        }
        let declared = (TRANSMIT_HEADER_LEN - 3 + payload_len) as u16;

        let mut out = [0u8; TRANSMIT_HEADER_LEN];
        out[0] = DELIMITER;
        out[1..3].copy_from_slice(&declared.to_be_bytes());
        out[3] = FrameType::TransmitRequest.as_byte();
        out[4] = self.frame_id;
        out[5..13].copy_from_slice(&self.dest64.to_be_bytes());
        out[13..15].copy_from_slice(&self.dest16.to_be_bytes());
        out[15] = self.broadcast_radius;
        out[16] = self.options;
        Ok(out)
    }
}

/// Build a transmit request into one buffer, without escaping.
///
/// Only wire-correct when no byte after the delimiter is reserved (see
/// [`needs_escape`](crate::escape::needs_escape)). Use
/// [`write_transmit_escaped`] when the payload or address is arbitrary.
pub fn encode_transmit_raw(header: &TransmitHeader, payload: &[u8]) -> Result<BytesMut> {
    let head = header.to_bytes(payload.len())?;

    let mut frame = BytesMut::with_capacity(TRANSMIT_HEADER_LEN + payload.len() + 1);
    frame.put_slice(&head);
    frame.put_slice(payload);
    let sum = checksum(&frame, frame.len());
    frame.put_u8(sum);
    Ok(frame)
}

/// Stream a transmit request to `sink` byte by byte, escaping as it goes.
///
/// The checksum covers the logical bytes, not the stuffed ones. Nothing is
/// written if the payload is too large.
pub fn write_transmit_escaped<S: ByteSink + ?Sized>(
    sink: &mut S,
    header: &TransmitHeader,
    payload: &[u8],
) -> Result<()> {
    let head = header.to_bytes(payload.len())?;
    let mut sum = Checksum::new();

    sink.write_byte(head[0])?;
    for (idx, &byte) in head.iter().enumerate().skip(1) {
        write_escaped(sink, byte)?;
        if idx >= 3 {
            sum.push(byte);
        }
    }
    for &byte in payload {
        sum.push(byte);
        write_escaped(sink, byte)?;
    }
    write_escaped(sink, sum.finish())?;

    trace!(
        dest64 = header.dest64,
        payload = payload.len(),
        "transmit request written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::{needs_escape, ESCAPE};

    #[test]
    fn at_frame_without_params() {
        let frame = encode_local_at(0x01, *b"NI", &[]);
        assert_eq!(
            frame.as_ref(),
            &[0x7E, 0x00, 0x04, 0x08, 0x01, b'N', b'I', 0x5F]
        );
    }

    #[test]
    fn at_frame_with_params() {
        let frame = encode_local_at(0x52, *b"NJ", &[0xFF]);
        assert_eq!(&frame[..8], &[0x7E, 0x00, 0x05, 0x08, 0x52, b'N', b'J', 0xFF]);
        assert_eq!(frame.len(), 9);
        assert_eq!(frame[8], checksum(&frame, 8));
    }

    #[test]
    fn at_frame_accepts_full_parameter_block() {
        let params = [0xAB; MAX_AT_PARAMS];
        let frame = encode_local_at(0x02, *b"KY", &params);
        assert_eq!(frame.len(), AT_FRAME_BUFFER);
        assert_eq!(frame[2] as usize, 4 + MAX_AT_PARAMS);
    }

    #[test]
    #[should_panic(expected = "AT command parameters too long")]
    fn at_frame_rejects_oversized_params() {
        let params = [0u8; MAX_AT_PARAMS + 1];
        let _ = encode_local_at(0x01, *b"KY", &params);
    }

    #[test]
    fn raw_transmit_layout() {
        let header = TransmitHeader::raw(0x0013_A200_4052_2B6A);
        let frame = encode_transmit_raw(&header, b"Hi").unwrap();

        assert_eq!(
            &frame[..TRANSMIT_HEADER_LEN],
            &[
                0x7E, 0x00, 0x10, 0x10, 0x01, 0x00, 0x13, 0xA2, 0x00, 0x40, 0x52, 0x2B, 0x6A,
                0xFF, 0xFE, 0x00, 0x00,
            ]
        );
        assert_eq!(&frame[17..19], b"Hi");
        assert_eq!(frame.len(), 20);
        assert_eq!(frame[19], checksum(&frame, 19));
    }

    #[test]
    fn raw_transmit_does_not_escape() {
        let header = TransmitHeader::raw(0x7E);
        let frame = encode_transmit_raw(&header, &[0x7D, 0x11]).unwrap();
        assert_eq!(frame[12], 0x7E);
        assert_eq!(&frame[17..19], &[0x7D, 0x11]);
    }

    #[test]
    fn streamed_transmit_matches_raw_when_nothing_is_reserved() {
        let header = TransmitHeader::streamed(0x0000_0000_0000_FFFF);
        let mut wire = Vec::new();
        write_transmit_escaped(&mut wire, &header, b"abcd").unwrap();

        let raw = encode_transmit_raw(&header, b"abcd").unwrap();
        assert_eq!(wire, raw.to_vec());
        assert_eq!(&wire[3..5], &[0x10, 0x00]);
        assert_eq!(&wire[15..17], &[0x01, 0x01]);
    }

    #[test]
    fn streamed_transmit_escapes_reserved_bytes() {
        let header = TransmitHeader::streamed(0x0013_A200_0000_0000);
        let payload = [0x7E, 0x41];
        let mut wire = Vec::new();
        write_transmit_escaped(&mut wire, &header, &payload).unwrap();

        assert_eq!(wire[0], DELIMITER);
        assert!(!wire[1..].contains(&DELIMITER));
        // 0x13 in the address and 0x7E in the payload are both stuffed
        let escapes = wire.iter().filter(|&&b| b == ESCAPE).count();
        assert!(escapes >= 2);
        for pair in wire[1..].windows(2) {
            if pair[0] == ESCAPE {
                assert!(needs_escape(pair[1] ^ 0x20));
            }
        }
    }

    #[test]
    fn checksum_covers_logical_bytes() {
        let header = TransmitHeader::streamed(0x7D7D_7D7D_7D7D_7D7D);
        let payload = [0x11, 0x13, 0x7E];
        let mut wire = Vec::new();
        write_transmit_escaped(&mut wire, &header, &payload).unwrap();

        let raw = encode_transmit_raw(&header, &payload).unwrap();
        let mut expected = bytes::BytesMut::new();
        crate::escape::escape_into(&raw, &mut expected);
        assert_eq!(wire, expected.to_vec());
    }

    #[test]
    fn oversized_payload_writes_nothing() {
        let payload = vec![0u8; MAX_TRANSMIT_PAYLOAD + 1];
        let mut wire = Vec::new();
        let err = write_transmit_escaped(&mut wire, &TransmitHeader::streamed(1), &payload)
            .unwrap_err();

        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(wire.is_empty());
        assert!(encode_transmit_raw(&TransmitHeader::raw(1), &payload).is_err());
    }
}
