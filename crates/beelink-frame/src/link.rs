use beelink_transport::{ByteSink, ByteSource};
use bytes::BytesMut;
use tracing::trace;

use crate::decoder::{DecoderStats, FrameDecoder};
use crate::encoder::{
    encode_local_at, encode_transmit_raw, write_transmit_escaped, AtCommand, TransmitHeader,
};
use crate::error::Result;
use crate::escape::escape_into;
use crate::frame::FrameView;

/// Destination used until [`ApiLink::set_dest_addr64`] is called.
pub const DEFAULT_DEST_ADDR64: u64 = 0x0000_0000_0000_00FF;

/// Configuration for an [`ApiLink`].
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// 64-bit destination for data frames. Default: `0xFF`.
    pub dest_addr64: u64,
    /// Frame id of the first AT command. Default: 1.
    pub initial_frame_id: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            dest_addr64: DEFAULT_DEST_ADDR64,
            initial_frame_id: 1,
        }
    }
}

/// A radio module reached through a byte port.
///
/// Owns the port, the inbound [`FrameDecoder`] and the frame-id counter for
/// outbound AT commands. Drive it by calling [`tick`](Self::tick) from the
/// application loop; every validated inbound frame goes to the callback.
///
/// The frame id advances after every AT command and wraps from 254 to 0.
/// Radios treat frame id 0 as "no response wanted", so one command in every
/// 255 goes out without an acknowledgement.
pub struct ApiLink<T> {
    port: T,
    decoder: FrameDecoder,
    frame_id: u8,
    dest_addr64: u64,
    scratch: BytesMut,
}

impl<T> ApiLink<T> {
    /// Create a link with default configuration.
    pub fn new(port: T) -> Self {
        Self::with_config(port, LinkConfig::default())
    }

    /// Create a link with explicit configuration.
    pub fn with_config(port: T, config: LinkConfig) -> Self {
        Self {
            port,
            decoder: FrameDecoder::new(),
            frame_id: config.initial_frame_id,
            dest_addr64: config.dest_addr64,
            scratch: BytesMut::with_capacity(64),
        }
    }

    /// Register the inbound frame handler, replacing any previous one.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&FrameView<'_>) + Send + 'static,
    {
        self.decoder.set_callback(callback);
    }

    pub fn clear_callback(&mut self) {
        self.decoder.clear_callback();
    }

    pub fn set_dest_addr64(&mut self, addr64: u64) {
        self.dest_addr64 = addr64;
    }

    pub fn dest_addr64(&self) -> u64 {
        self.dest_addr64
    }

    /// Frame id the next AT command will carry.
    pub fn frame_id(&self) -> u8 {
        self.frame_id
    }

    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Borrow the underlying port.
    pub fn get_ref(&self) -> &T {
        &self.port
    }

    /// Mutably borrow the underlying port.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.port
    }

    /// Consume the link and return the port.
    pub fn into_inner(self) -> T {
        self.port
    }
}

impl<T: ByteSource> ApiLink<T> {
    /// Consume at most one byte from the port.
    ///
    /// Returns `Ok(false)` when nothing was available.
    pub fn tick(&mut self) -> Result<bool> {
        self.decoder.tick(&mut self.port)
    }
}

impl<T: ByteSink> ApiLink<T> {
    /// Send a local AT command without parameters.
    pub fn send_local_at(&mut self, command: AtCommand) -> Result<()> {
        self.send_local_at_with_params(command, &[])
    }

    /// Send a local AT command.
    ///
    /// # Panics
    ///
    /// Panics if `params` is longer than
    /// [`MAX_AT_PARAMS`](crate::encoder::MAX_AT_PARAMS).
    pub fn send_local_at_with_params(&mut self, command: AtCommand, params: &[u8]) -> Result<()> {
        let frame = encode_local_at(self.frame_id, command, params);
        self.scratch.clear();
        escape_into(&frame, &mut self.scratch);
        self.port.write_bytes(&self.scratch)?;
        self.port.flush()?;

        trace!(
            command = %String::from_utf8_lossy(&command),
            frame_id = self.frame_id,
            params = params.len(),
            "AT command sent"
        );
        self.frame_id = next_frame_id(self.frame_id);
        Ok(())
    }

    /// Send `payload` to the destination address as one unescaped write.
    ///
    /// Only safe when no header or payload byte is reserved; prefer
    /// [`send_data`](Self::send_data) for arbitrary payloads. That includes
    /// the length field: a 111-byte payload declares length 0x7D, which a
    /// [`FrameDecoder`] reads as an escape marker.
    pub fn send_data_raw(&mut self, payload: &[u8]) -> Result<()> {
        let frame = encode_transmit_raw(&TransmitHeader::raw(self.dest_addr64), payload)?;
        self.port.write_bytes(&frame)?;
        self.port.flush()?;
        Ok(())
    }

    /// Stream `payload` to the destination address, escaping as needed.
    pub fn send_data(&mut self, payload: &[u8]) -> Result<()> {
        write_transmit_escaped(
            &mut self.port,
            &TransmitHeader::streamed(self.dest_addr64),
            payload,
        )?;
        self.port.flush()?;
        Ok(())
    }
}

impl<T> std::fmt::Debug for ApiLink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiLink")
            .field("frame_id", &self.frame_id)
            .field("dest_addr64", &format_args!("{:#018x}", self.dest_addr64))
            .field("decoder", &self.decoder)
            .finish()
    }
}

pub(crate) fn next_frame_id(id: u8) -> u8 {
    ((id as u16 + 1) % 255) as u8
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use beelink_transport::MemoryPort;

    use super::*;
    use crate::decoder::FrameDecoder;
    use crate::escape::DELIMITER;
    use crate::frame_type::FrameType;

    fn unescape(wire: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut escaped = false;
        for &b in wire {
            if escaped {
                out.push(b ^ 0x20);
                escaped = false;
            } else if b == 0x7D {
                escaped = true;
            } else {
                out.push(b);
            }
        }
        out
    }

    #[test]
    fn frame_ids_count_up_and_wrap_to_zero() {
        let mut link = ApiLink::new(MemoryPort::new());
        let mut ids = Vec::new();
        for _ in 0..256 {
            ids.push(link.frame_id());
            link.send_local_at(*b"NI").unwrap();
        }

        assert_eq!(&ids[..3], &[1, 2, 3]);
        assert_eq!(ids[253], 254);
        assert_eq!(ids[254], 0);
        assert_eq!(ids[255], 1);
    }

    #[test]
    fn at_command_frame_is_escaped_on_the_wire() {
        let config = LinkConfig {
            initial_frame_id: 0x11,
            ..LinkConfig::default()
        };
        let mut link = ApiLink::with_config(MemoryPort::new(), config);
        link.send_local_at(*b"NI").unwrap();

        let wire = link.get_mut().take_tx();
        assert_eq!(&wire[..6], &[0x7E, 0x00, 0x04, 0x08, 0x7D, 0x31]);
        assert_eq!(
            unescape(&wire),
            encode_local_at(0x11, *b"NI", &[]).to_vec()
        );
    }

    #[test]
    fn at_command_with_params() {
        let mut link = ApiLink::new(MemoryPort::new());
        link.send_local_at_with_params(*b"DL", &[0x00, 0x00, 0xFF, 0xFF])
            .unwrap();

        let wire = link.into_inner().take_tx();
        assert_eq!(wire.len(), 12);
        assert_eq!(&wire[..7], &[0x7E, 0x00, 0x08, 0x08, 0x01, b'D', b'L']);
    }

    #[test]
    fn send_data_uses_destination() {
        let mut link = ApiLink::new(MemoryPort::new());
        assert_eq!(link.dest_addr64(), DEFAULT_DEST_ADDR64);
        link.set_dest_addr64(0x0013_A200_4052_2B6A);
        link.send_data(b"hello").unwrap();

        let wire = unescape(link.get_ref().tx());
        assert_eq!(wire[0], DELIMITER);
        assert_eq!(&wire[5..13], &0x0013_A200_4052_2B6Au64.to_be_bytes());
        assert_eq!(&wire[17..22], b"hello");
    }

    #[test]
    fn send_data_raw_is_unescaped() {
        let mut link = ApiLink::new(MemoryPort::new());
        link.set_dest_addr64(0x7E);
        link.send_data_raw(&[0x7D]).unwrap();

        let wire = link.get_ref().tx();
        assert_eq!(wire[12], 0x7E);
        assert_eq!(wire[17], 0x7D);
        assert_eq!(wire.len(), 19);
    }

    #[test]
    fn data_frames_do_not_touch_frame_id() {
        let mut link = ApiLink::new(MemoryPort::new());
        link.send_data(b"x").unwrap();
        link.send_data_raw(b"y").unwrap();
        assert_eq!(link.frame_id(), 1);
    }

    #[test]
    fn tick_delivers_inbound_frames() {
        let (tx, rx) = mpsc::channel();
        let mut link = ApiLink::new(MemoryPort::new());
        link.set_callback(move |view| {
            let _ = tx.send(view.to_owned_frame());
        });

        link.get_mut()
            .push_rx(&[0x7E, 0x00, 0x05, 0x88, 0x01, b'N', b'I', 0x00, 0xDF]);
        while link.tick().unwrap() {}

        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.frame_type, FrameType::AtCommandResponse);
        assert_eq!(frame.payload.as_ref(), &[b'N', b'I', 0x00]);
        assert_eq!(link.stats().frames_delivered, 1);
    }

    #[test]
    fn outbound_at_frame_decodes_cleanly() {
        let mut link = ApiLink::new(MemoryPort::new());
        link.send_local_at_with_params(*b"ID", &[0x7E, 0x11]).unwrap();
        let wire = link.into_inner().take_tx();

        // An AT command is not dispatched, but it must pass the checksum.
        let mut decoder = FrameDecoder::new();
        decoder.feed_slice(&wire);
        assert_eq!(decoder.stats().checksum_failures, 0);
        assert_eq!(decoder.stats().frames_ignored, 1);
    }
}
