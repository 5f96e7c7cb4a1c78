use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::{Duration, Instant};

use crate::error::{self, Result};

use super::ByteStream;

/// A blocking socket whose I/O timeouts can be adjusted.
pub trait SyncSocket: Read + Write + Send {
    /// Applies `timeout` to both reads and writes; `None` blocks indefinitely.
    fn set_io_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Shuts down both directions.
    fn shutdown(&self) -> io::Result<()>;
}

impl SyncSocket for TcpStream {
    fn set_io_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout)?;
        self.set_write_timeout(timeout)
    }

    fn shutdown(&self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// [`ByteStream`] over a blocking socket, bounded by a deadline.
///
/// Before every operation the time left until the deadline becomes the
/// socket timeout, so no single call can outlive the attempt.
#[derive(Debug)]
pub struct BlockingStream<S> {
    inner: S,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
}

impl<S: SyncSocket> BlockingStream<S> {
    /// Wraps `inner`. `timeout` is the attempt's total budget and is only
    /// used to report how long the attempt was allowed to run.
    pub fn new(inner: S, deadline: Option<Instant>, timeout: Option<Duration>) -> Self {
        Self {
            inner,
            deadline,
            timeout,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Clears the socket timeouts and returns the socket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) if the socket
    /// rejects the option.
    pub fn into_inner(self) -> Result<S> {
        self.inner
            .set_io_timeout(None)
            .map_err(|e| error::connection("Failed to clear socket timeouts", e))?;
        Ok(self.inner)
    }

    /// Borrows the socket as plain [`Read`] + [`Write`] that re-arms the
    /// deadline before every call.
    ///
    /// For protocols driven by another library, such as a TLS handshake.
    pub fn deadline_io(&mut self) -> DeadlineIo<'_, S> {
        DeadlineIo { stream: self }
    }

    /// Applies the remaining budget as the socket timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`](crate::Error::Timeout) once the deadline has
    /// passed; no I/O is attempted then.
    pub fn arm(&self) -> Result<()> {
        let Some(deadline) = self.deadline else {
            return Ok(());
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(error::timeout(self.timeout));
        }
        self.inner
            .set_io_timeout(Some(remaining))
            .map_err(|e| error::connection("Failed to set socket timeout", e))
    }

    fn map_io(&self, context: &str, e: io::Error) -> error::Error {
        error::from_io(context, e, self.timeout)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            self.arm()?;
            match self.inner.read(buf) {
                Ok(read) => return Ok(read),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.map_io("Failed to read from proxy", e)),
            }
        }
    }
}

/// Deadline-bounded [`Read`] + [`Write`] view of a [`BlockingStream`].
///
/// An exhausted deadline surfaces as [`io::ErrorKind::TimedOut`].
#[derive(Debug)]
pub struct DeadlineIo<'a, S> {
    stream: &'a mut BlockingStream<S>,
}

impl<S: SyncSocket> DeadlineIo<'_, S> {
    fn arm(&self) -> io::Result<()> {
        self.stream.arm().map_err(|e| {
            if e.is_timeout() {
                io::Error::new(io::ErrorKind::TimedOut, e)
            } else {
                io::Error::other(e)
            }
        })
    }
}

impl<S: SyncSocket> Read for DeadlineIo<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.arm()?;
        self.stream.inner.read(buf)
    }
}

impl<S: SyncSocket> Write for DeadlineIo<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.arm()?;
        self.stream.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.arm()?;
        self.stream.inner.flush()
    }
}

impl<S: SyncSocket> ByteStream for BlockingStream<S> {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < data.len() {
            self.arm()?;
            match self.inner.write(&data[written..]) {
                Ok(0) => {
                    return Err(self.map_io(
                        "Failed to write to proxy",
                        io::Error::from(io::ErrorKind::WriteZero),
                    ));
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.map_io("Failed to write to proxy", e)),
            }
        }
        self.arm()?;
        self.inner
            .flush()
            .map_err(|e| self.map_io("Failed to flush proxy socket", e))
    }

    async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let read = self.read_some(&mut buf[filled..])?;
            if read == 0 {
                return Err(error::connection_closed());
            }
            filled += read;
        }
        Ok(buf)
    }

    async fn read_to_eof(&mut self, buffer_size: usize) -> Result<Vec<u8>> {
        let buffer_size = buffer_size.max(1);
        let mut data = Vec::new();
        let mut chunk = vec![0u8; buffer_size];
        loop {
            let read = self.read_some(&mut chunk)?;
            data.extend_from_slice(&chunk[..read]);
            if read < buffer_size {
                break;
            }
        }
        Ok(data)
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.shutdown() {
            tracing::trace!(target: "sockhop::transport", error = %e, "shutdown failed");
        }
    }
}
