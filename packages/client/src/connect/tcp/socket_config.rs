//! TCP socket configuration utilities
//!
//! Applies `TCP_NODELAY` and keepalive to proxy sockets. Keepalive goes
//! through `socket2`, which std does not expose.

use std::io;
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};

use crate::config::ConnectConfig;

/// Socket options applied right after the proxy socket connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOptions {
    pub nodelay: bool,
    pub keepalive: Option<Duration>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            nodelay: true,
            keepalive: None,
        }
    }
}

impl From<&ConnectConfig> for SocketOptions {
    fn from(config: &ConnectConfig) -> Self {
        Self {
            nodelay: config.nodelay,
            keepalive: config.keepalive,
        }
    }
}

/// Configure a connected TCP socket.
///
/// # Arguments
/// * `socket` - Borrowed socket, e.g. `SockRef::from(&stream)` for a std or tokio `TcpStream`
/// * `options` - Options to apply
///
/// # Returns
/// * `Ok(())` - All options applied
/// * `Err(io::Error)` - The OS rejected an option
pub fn configure_tcp_socket(socket: SockRef<'_>, options: SocketOptions) -> io::Result<()> {
    socket.set_tcp_nodelay(options.nodelay)?;

    if let Some(idle) = options.keepalive {
        let keepalive = TcpKeepalive::new().with_time(idle);
        socket.set_tcp_keepalive(&keepalive)?;
    }

    tracing::trace!(
        target: "sockhop::tcp",
        nodelay = options.nodelay,
        keepalive_secs = options.keepalive.map(|d| d.as_secs()),
        "socket configured"
    );
    Ok(())
}
