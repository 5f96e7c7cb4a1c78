//! Per-connector connect settings.

use std::time::Duration;

/// Default deadline for one complete connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default chunk size used when draining a proxy reply.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Smallest accepted drain chunk: one byte more than the longest SOCKS5
/// bound-address field (type, length, 255-byte name, port), so a complete
/// reply always ends on a short read.
pub const MIN_READ_BUFFER_SIZE: usize = 1 + 1 + 255 + 2 + 1;

/// Default cap on HTTP CONNECT response headers.
pub const DEFAULT_MAX_RESPONSE_HEADER_BYTES: usize = 16 * 1024;

/// Settings applied to every connect attempt a connector makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    /// Deadline covering resolution, proxy connect and the whole handshake.
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// `TCP_NODELAY` on the proxy socket.
    pub nodelay: bool,
    /// TCP keepalive idle time on the proxy socket.
    pub keepalive: Option<Duration>,
    /// Chunk size for best-effort reads of proxy replies.
    pub read_buffer_size: usize,
    /// Largest HTTP CONNECT response head accepted.
    pub max_response_header_bytes: usize,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            nodelay: true,
            keepalive: None,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_response_header_bytes: DEFAULT_MAX_RESPONSE_HEADER_BYTES,
        }
    }
}

impl ConnectConfig {
    /// Set the connect deadline
    ///
    /// # Arguments
    /// * `timeout` - Upper bound for one attempt, from DNS through the last handshake byte
    ///
    /// # Examples
    /// ```no_run
    /// use std::time::Duration;
    /// use sockhop_client::config::ConnectConfig;
    ///
    /// let config = ConnectConfig::default().with_timeout(Duration::from_secs(5));
    /// assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    /// ```
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the connect deadline.
    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    #[must_use]
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Enable TCP keepalive on the proxy socket
    ///
    /// # Arguments
    /// * `idle` - Idle time before keepalive packets start
    #[must_use]
    pub fn with_keepalive(mut self, idle: Duration) -> Self {
        self.keepalive = Some(idle);
        self
    }

    /// Set the chunk size used to drain proxy replies.
    ///
    /// Values below [`MIN_READ_BUFFER_SIZE`] are raised to it.
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(MIN_READ_BUFFER_SIZE);
        self
    }

    /// Set the largest HTTP CONNECT response head accepted.
    #[must_use]
    pub fn with_max_response_header_bytes(mut self, limit: usize) -> Self {
        self.max_response_header_bytes = limit;
        self
    }
}
