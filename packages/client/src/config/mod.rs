//! Proxy, destination and connect configuration.

pub mod builder;
pub mod connect;
pub mod proxy;
pub mod target;
mod url;

pub use builder::{ConfigWarning, ProxyConfig, ProxyConfigBuilder};
pub use connect::ConnectConfig;
pub use proxy::{Credentials, ProxyEndpoint, ProxyHop, ProxyType};
pub use target::{DestinationTarget, Origin, Scheme};
