use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;

use bytes::{Buf, BytesMut};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, ByteSource};

const READ_CHUNK_SIZE: usize = 256;
#[cfg(unix)]
const WRITE_READY_TIMEOUT_MS: libc::c_int = 1000;

/// Adapts any `Read + Write` stream to the byte source/sink contract.
///
/// Received bytes are pulled a chunk at a time into an internal buffer so
/// that [`bytes_available`](ByteSource::bytes_available) can be answered
/// cheaply. Non-blocking streams and streams with a read timeout report
/// "nothing available" instead of failing.
///
/// A write that would block on a port from [`StreamPort::open`] waits up to
/// one second for the device to become writable. On a wrapped stream the
/// `WouldBlock` error is returned to the caller.
pub struct StreamPort<T> {
    inner: T,
    rx: BytesMut,
    closed: bool,
    #[cfg(unix)]
    fd: Option<std::os::unix::io::RawFd>,
}

impl<T: Read + Write> StreamPort<T> {
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            rx: BytesMut::with_capacity(READ_CHUNK_SIZE),
            closed: false,
            #[cfg(unix)]
            fd: None,
        }
    }

    /// Whether the stream has reported end-of-file.
    ///
    /// Buffered bytes may still be readable after this turns true.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the port and return the inner stream.
    ///
    /// Any bytes buffered but not yet read are dropped.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn fill(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    debug!("stream reached end of file");
                    self.closed = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.rx.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(())
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    #[cfg(unix)]
    fn wait_writable(&self, err: io::Error) -> Result<()> {
        let Some(fd) = self.fd else {
            return Err(TransportError::Io(err));
        };
        let mut pfd = libc::pollfd {
            fd,
            events: libc::POLLOUT,
            revents: 0,
        };
        loop {
            // SAFETY: `pfd` is a valid pollfd for the duration of the call and
            // the count passed is 1.
            let rc = unsafe { libc::poll(&mut pfd, 1, WRITE_READY_TIMEOUT_MS) };
            if rc > 0 {
                return Ok(());
            }
            if rc == 0 {
                return Err(TransportError::Io(io::Error::new(
                    ErrorKind::TimedOut,
                    "device not writable",
                )));
            }
            let os = io::Error::last_os_error();
            if os.kind() != ErrorKind::Interrupted {
                return Err(TransportError::Io(os));
            }
        }
    }

    #[cfg(not(unix))]
    fn wait_writable(&self, err: io::Error) -> Result<()> {
        Err(TransportError::Io(err))
    }
}

impl StreamPort<File> {
    /// Open a device path (for example `/dev/ttyUSB0`) for reading and writing.
    ///
    /// On Unix the descriptor is non-blocking, so polling an idle device
    /// returns at once.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY);
        }
        let file = options.open(path).map_err(|source| TransportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!(?path, "opened device");

        #[allow(unused_mut)]
        let mut port = Self::new(file);
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            port.fd = Some(port.inner.as_raw_fd());
        }
        Ok(port)
    }
}

impl<T: Read + Write> ByteSource for StreamPort<T> {
    fn bytes_available(&mut self) -> Result<usize> {
        if self.rx.is_empty() {
            self.fill()?;
        }
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.rx.is_empty() {
            self.fill()?;
        }
        if self.rx.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.rx.get_u8()))
    }
}

impl<T: Read + Write> ByteSink for StreamPort<T> {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_bytes(&[byte])
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => self.wait_writable(err)?,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => self.wait_writable(err)?,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T> std::fmt::Debug for StreamPort<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPort")
            .field("buffered", &self.rx.len())
            .field("closed", &self.closed)
            .finish()
    }
}
