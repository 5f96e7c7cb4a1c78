use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{self, Result};

use super::ByteStream;

/// [`ByteStream`] over any tokio stream.
#[derive(Debug)]
pub struct TokioStream<S> {
    inner: S,
}

impl<S> TokioStream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> ByteStream for TokioStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.inner
            .write_all(data)
            .await
            .map_err(|e| error::from_io("Failed to write to proxy", e, None))?;
        self.inner
            .flush()
            .await
            .map_err(|e| error::from_io("Failed to flush proxy socket", e, None))
    }

    async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let read = self
                .inner
                .read(&mut buf[filled..])
                .await
                .map_err(|e| error::from_io("Failed to read from proxy", e, None))?;
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
            let read = self
                .inner
                .read(&mut chunk)
                .await
                .map_err(|e| error::from_io("Failed to read from proxy", e, None))?;
            data.extend_from_slice(&chunk[..read]);
            if read < buffer_size {
                break;
            }
        }
        Ok(data)
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.shutdown().await {
            tracing::trace!(target: "sockhop::transport", error = %e, "shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;

    #[tokio::test]
    async fn read_exact_accumulates_partial_reads() {
        let mock = Builder::new().read(&[1, 2]).read(&[3]).read(&[4, 5]).build();
        let mut stream = TokioStream::new(mock);
        assert_eq!(stream.read_exact(3).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(stream.read_exact(2).await.unwrap(), vec![4, 5]);
    }

    #[tokio::test]
    async fn read_exact_reports_early_eof() {
        let mock = Builder::new().read(&[1]).build();
        let mut stream = TokioStream::new(mock);
        let err = stream.read_exact(2).await.unwrap_err();
        assert_eq!(err.to_string(), "Connection closed unexpectedly");
    }

    #[tokio::test]
    async fn read_to_eof_stops_on_short_read() {
        let mock = Builder::new().read(&[0; 4]).read(&[9; 2]).build();
        let mut stream = TokioStream::new(mock);
        assert_eq!(stream.read_to_eof(4).await.unwrap(), vec![0, 0, 0, 0, 9, 9]);
    }

    #[tokio::test]
    async fn write_errors_map_to_connection() {
        let mock = Builder::new()
            .write_error(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            .build();
        let mut stream = TokioStream::new(mock);
        assert!(stream.write_all(b"x").await.unwrap_err().is_connect());
    }
}
