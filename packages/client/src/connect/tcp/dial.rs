//! Async socket opening.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use socket2::SockRef;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use super::socket_config::{SocketOptions, configure_tcp_socket};

/// Opens the raw connection to the first proxy of a route.
///
/// The default is [`TcpDialer`]; custom dialers let callers bind local
/// addresses, tunnel through something other than TCP, or simulate network
/// conditions in tests.
pub trait Dial: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connects to `addr`. The connector applies the deadline.
    fn dial(&self, addr: SocketAddr) -> impl Future<Output = io::Result<Self::Stream>> + Send;

    /// Applies socket options to a freshly dialed stream.
    ///
    /// The default does nothing, for streams that are not TCP sockets.
    fn configure(&self, stream: &Self::Stream, options: SocketOptions) -> io::Result<()> {
        let _ = (stream, options);
        Ok(())
    }
}

/// Plain tokio TCP dialer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl TcpDialer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Dial for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, addr: SocketAddr) -> io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }

    fn configure(&self, stream: &TcpStream, options: SocketOptions) -> io::Result<()> {
        configure_tcp_socket(SockRef::from(stream), options)
    }
}
