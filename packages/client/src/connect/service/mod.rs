//! Connection orchestration: proxy socket, deadline, negotiation, TLS.
//!
//! [`ProxyConnector`] runs on tokio; [`blocking::BlockingProxyConnector`]
//! blocks the calling thread. Both drive the same negotiators and produce the
//! same errors; callers pick one by constructing it.

pub mod blocking;
mod proxy;

use std::net::SocketAddr;

use crate::config::ProxyEndpoint;
use crate::dns::{Resolve, classify};
use crate::error::Result;

pub use blocking::BlockingProxyConnector;
pub use proxy::{ProxyConnector, connect_through_proxy};

/// Socket address of a proxy. Literal hosts never reach the resolver.
pub(crate) async fn proxy_address<R: Resolve>(resolver: &R, endpoint: &ProxyEndpoint) -> Result<SocketAddr> {
    let ip = match classify(endpoint.host()).ip() {
        Some(ip) => ip,
        None => resolver.resolve(endpoint.host()).await?.ip(),
    };
    Ok(SocketAddr::new(ip, endpoint.port()))
}
