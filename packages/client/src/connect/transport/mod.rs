//! Byte-stream transport used by the negotiators.
//!
//! Handshakes are written once as `async fn`s over [`ByteStream`]. The tokio
//! connector hands them a [`TokioStream`]; the blocking connector hands them a
//! [`BlockingStream`], whose futures finish on the first poll, and drives them
//! with `futures::executor::block_on`.

mod blocking;
mod tokio_stream;

use std::future::Future;

use crate::error::Result;

pub use blocking::{BlockingStream, DeadlineIo, SyncSocket};
pub use tokio_stream::TokioStream;

/// The transport operations a proxy handshake needs.
pub trait ByteStream: Send {
    /// Writes every byte of `data`, then flushes.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Reads exactly `n` bytes.
    ///
    /// Fails with `Proxy("Connection closed unexpectedly")` if the peer closes first.
    fn read_exact(&mut self, n: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Reads chunks of `buffer_size` until a short read or EOF.
    ///
    /// Drains a reply whose length is not known up front without waiting for
    /// the peer to close.
    fn read_to_eof(&mut self, buffer_size: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Best-effort shutdown. Never fails.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
