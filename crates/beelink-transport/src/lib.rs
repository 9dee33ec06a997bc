//! Byte-level transport abstraction for serial radio links.
//!
//! The frame codec never touches a serial port directly. It consumes bytes
//! through [`ByteSource`] and emits them through [`ByteSink`]; this crate
//! provides those traits and a couple of concrete ports:
//! - [`StreamPort`] over any `Read + Write` stream (a tty device, a pipe)
//! - [`MemoryPort`] for in-process loopback and tests
//!
//! Line configuration (baud rate, parity) is the caller's business.

pub mod error;
pub mod memory;
pub mod stream;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryPort;
pub use stream::StreamPort;
pub use traits::{ByteSink, ByteSource};
