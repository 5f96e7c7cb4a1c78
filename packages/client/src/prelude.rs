//! Sockhop Prelude
//!
//! The types most callers need to open a tunnel.

pub use crate::config::{ConnectConfig, DestinationTarget, Origin, ProxyConfig, ProxyType};
pub use crate::connect::{BlockingProxyConnector, MaybeTlsStream, ProxyConnector, TlsConfig};
pub use crate::dns::{Resolve, StaticResolver};
pub use crate::error::{Error, Result};
