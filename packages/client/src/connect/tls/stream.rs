//! Origin-level stream types: plain or TLS, tunnelled through the proxy.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::pin::Pin;
use std::task::{Context, Poll};

use rustls::{ClientConnection, StreamOwned};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_rustls::client::TlsStream;

const ALPN_H2: &[u8] = b"h2";

/// Blocking TLS stream over a tunnelled socket.
pub type BlockingTlsStream = StreamOwned<ClientConnection, TcpStream>;

/// Async stream to an origin, TLS-wrapped for `https`.
#[derive(Debug)]
pub enum MaybeTlsStream<S> {
    Plain(S),
    Tls(Box<TlsStream<S>>),
}

impl<S> MaybeTlsStream<S> {
    #[must_use]
    pub fn is_tls(&self) -> bool {
        matches!(self, MaybeTlsStream::Tls(_))
    }

    /// The protocol agreed via ALPN, if any.
    #[must_use]
    pub fn negotiated_alpn(&self) -> Option<&[u8]> {
        match self {
            MaybeTlsStream::Plain(_) => None,
            MaybeTlsStream::Tls(tls) => tls.get_ref().1.alpn_protocol(),
        }
    }

    /// Whether the server agreed to HTTP/2.
    #[must_use]
    pub fn is_http2(&self) -> bool {
        self.negotiated_alpn() == Some(ALPN_H2)
    }

    /// The tunnelled transport underneath any TLS layer.
    pub fn get_ref(&self) -> &S {
        match self {
            MaybeTlsStream::Plain(stream) => stream,
            MaybeTlsStream::Tls(tls) => tls.get_ref().0,
        }
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncRead for MaybeTlsStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            MaybeTlsStream::Tls(tls) => Pin::new(tls.as_mut()).poll_read(cx, buf),
        }
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncWrite for MaybeTlsStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            MaybeTlsStream::Tls(tls) => Pin::new(tls.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            MaybeTlsStream::Tls(tls) => Pin::new(tls.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            MaybeTlsStream::Tls(tls) => Pin::new(tls.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Blocking stream to an origin, TLS-wrapped for `https`.
#[derive(Debug)]
pub enum BlockingMaybeTlsStream {
    Plain(TcpStream),
    Tls(Box<BlockingTlsStream>),
}

impl BlockingMaybeTlsStream {
    #[must_use]
    pub fn is_tls(&self) -> bool {
        matches!(self, BlockingMaybeTlsStream::Tls(_))
    }

    #[must_use]
    pub fn negotiated_alpn(&self) -> Option<&[u8]> {
        match self {
            BlockingMaybeTlsStream::Plain(_) => None,
            BlockingMaybeTlsStream::Tls(tls) => tls.conn.alpn_protocol(),
        }
    }

    #[must_use]
    pub fn is_http2(&self) -> bool {
        self.negotiated_alpn() == Some(ALPN_H2)
    }

    /// The tunnelled socket underneath any TLS layer.
    #[must_use]
    pub fn get_ref(&self) -> &TcpStream {
        match self {
            BlockingMaybeTlsStream::Plain(stream) => stream,
            BlockingMaybeTlsStream::Tls(tls) => &tls.sock,
        }
    }
}

impl Read for BlockingMaybeTlsStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BlockingMaybeTlsStream::Plain(stream) => stream.read(buf),
            BlockingMaybeTlsStream::Tls(tls) => tls.read(buf),
        }
    }
}

impl Write for BlockingMaybeTlsStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BlockingMaybeTlsStream::Plain(stream) => stream.write(buf),
            BlockingMaybeTlsStream::Tls(tls) => tls.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            BlockingMaybeTlsStream::Plain(stream) => stream.flush(),
            BlockingMaybeTlsStream::Tls(tls) => tls.flush(),
        }
    }
}
