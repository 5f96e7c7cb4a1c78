use std::io;
use std::time::Duration;

use crate::dns::ResolveError;

/// A `Result` alias where the `Err` case is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while reaching a destination through a proxy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The proxy rejected the request or answered with a malformed reply.
    #[error("{message}")]
    Proxy {
        message: String,
        /// Protocol status code (SOCKS reply code or HTTP status), when one exists.
        code: Option<u16>,
    },

    /// The TCP connection to the proxy failed or broke mid-handshake.
    #[error("{message}")]
    Connection {
        message: String,
        os_code: Option<i32>,
        #[source]
        source: Option<io::Error>,
    },

    /// The connect deadline elapsed.
    #[error("{}", describe_timeout(.after))]
    Timeout { after: Option<Duration> },

    /// A hostname could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The proxy or connect settings are invalid.
    #[error("{0}")]
    Config(String),

    /// The TLS handshake with the destination failed.
    #[error("TLS handshake with {host} failed: {source}")]
    Tls {
        host: String,
        #[source]
        source: io::Error,
    },
}

fn describe_timeout(after: &Option<Duration>) -> String {
    match after {
        Some(after) => format!("Proxy connection timed out after {}ms", after.as_millis()),
        None => "Proxy connection timed out".to_owned(),
    }
}
