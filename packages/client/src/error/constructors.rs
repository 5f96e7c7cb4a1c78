use std::io;
use std::time::Duration;

use super::types::Error;

/// Creates a protocol-level proxy error without a status code.
pub fn proxy(message: impl Into<String>) -> Error {
    Error::Proxy {
        message: message.into(),
        code: None,
    }
}

/// Creates a protocol-level proxy error carrying the proxy's status code.
pub fn proxy_with_code(message: impl Into<String>, code: u16) -> Error {
    Error::Proxy {
        message: message.into(),
        code: Some(code),
    }
}

/// The peer closed the stream before a complete reply arrived.
pub fn connection_closed() -> Error {
    proxy("Connection closed unexpectedly")
}

/// Creates a connection error from an OS-level failure.
pub fn connection(message: impl Into<String>, source: io::Error) -> Error {
    Error::Connection {
        message: message.into(),
        os_code: source.raw_os_error(),
        source: Some(source),
    }
}

/// Creates the error reported when the TCP connection to a proxy cannot be opened.
pub fn proxy_unreachable(host: &str, port: u16, source: io::Error) -> Error {
    let message = if host.contains(':') {
        format!("Can not connect to proxy [{host}]:{port} [{source}]")
    } else {
        format!("Can not connect to proxy {host}:{port} [{source}]")
    };
    connection(message, source)
}

/// Creates a timeout error.
pub fn timeout(after: Option<Duration>) -> Error {
    Error::Timeout { after }
}

/// Creates a configuration error.
pub fn config(message: impl Into<String>) -> Error {
    Error::Config(message.into())
}

/// Creates a TLS error for the destination leg.
pub fn tls(host: impl Into<String>, source: io::Error) -> Error {
    Error::Tls {
        host: host.into(),
        source,
    }
}

/// Maps an I/O failure on an established proxy socket.
///
/// Socket timeouts become [`Error::Timeout`] so blocking and async callers
/// observe the same variant when the deadline fires.
pub fn from_io(context: &str, source: io::Error, after: Option<Duration>) -> Error {
    match source.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => timeout(after),
        io::ErrorKind::UnexpectedEof => connection_closed(),
        _ => {
            let message = format!("{context}: {source}");
            connection(message, source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_message_matches_proxy_address() {
        let err = proxy_unreachable(
            "127.0.0.1",
            1080,
            io::Error::from(io::ErrorKind::ConnectionRefused),
        );
        let text = err.to_string();
        assert!(text.starts_with("Can not connect to proxy 127.0.0.1:1080 ["));
        assert!(err.is_connect());
    }

    #[test]
    fn unreachable_brackets_ipv6_hosts() {
        let err = proxy_unreachable("::1", 1080, io::Error::other("refused"));
        assert!(err.to_string().starts_with("Can not connect to proxy [::1]:1080"));
    }

    #[test]
    fn socket_timeouts_become_timeout_errors() {
        let err = from_io(
            "read",
            io::Error::from(io::ErrorKind::WouldBlock),
            Some(Duration::from_millis(250)),
        );
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Proxy connection timed out after 250ms");
    }

    #[test]
    fn eof_becomes_connection_closed() {
        let err = from_io("read", io::Error::from(io::ErrorKind::UnexpectedEof), None);
        assert!(err.is_proxy());
        assert_eq!(err.to_string(), "Connection closed unexpectedly");
    }
}
