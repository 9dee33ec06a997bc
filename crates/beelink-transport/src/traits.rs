use crate::error::Result;

/// Inbound half of a byte-oriented link.
///
/// Mirrors what a UART driver offers: ask how many bytes are waiting, then
/// pull them one at a time. Implementations must never block in
/// [`bytes_available`](ByteSource::bytes_available).
pub trait ByteSource {
    /// Number of bytes that can be read right now without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read one byte, or `None` if nothing is buffered.
    fn read_byte(&mut self) -> Result<Option<u8>>;
}

/// Outbound half of a byte-oriented link.
pub trait ByteSink {
    /// Write a single byte.
    fn write_byte(&mut self, byte: u8) -> Result<()>;

    /// Write a run of bytes.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Push any buffered output to the device.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        (**self).write_byte(byte)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Any `BytesMut` collects written bytes, which keeps encoders testable.
impl ByteSink for bytes::BytesMut {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.extend_from_slice(&[byte]);
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl ByteSink for Vec<u8> {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.push(byte);
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}
