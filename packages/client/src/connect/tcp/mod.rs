//! Opening and tuning the TCP socket to the first proxy.

mod dial;
mod socket_config;

pub use dial::{Dial, TcpDialer};
pub use socket_config::{SocketOptions, configure_tcp_socket};
