use beelink_transport::TransportError;

/// Errors that can occur while exchanging frames with the radio.
///
/// Corrupt or unrecognised inbound frames are never errors: the decoder
/// drops them and resynchronises on the next delimiter.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte source or sink failed.
    #[error("frame transport error: {0}")]
    Transport(#[from] TransportError),

    /// An I/O error surfaced through an async codec.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The payload does not fit in the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
