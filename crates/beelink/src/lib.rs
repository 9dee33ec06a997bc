//! Serial API frame codec for XBee-style radio modules.
//!
//! beelink turns the byte stream from a radio module into validated API
//! frames and builds outbound AT command and transmit request frames.
//!
//! # Crate Structure
//!
//! - [`transport`] - Byte source/sink traits and ports
//! - [`frame`] - Frame decoder, dispatcher, encoders and [`frame::ApiLink`]

/// Re-export transport types.
pub mod transport {
    pub use beelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use beelink_frame::*;
}

/// Re-export the `tokio_util` codec adapter (requires `async` feature).
#[cfg(feature = "async")]
pub mod codec {
    pub use beelink_frame::codec::*;
}
