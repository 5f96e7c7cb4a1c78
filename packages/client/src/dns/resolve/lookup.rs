//! Resolver backed by `tokio::net::lookup_host`.

use super::traits::Resolve;
use super::types::{ResolveError, ResolvedAddress};
use super::utilities::{select_address, validate_hostname};

/// Resolves with the system resolver on tokio's blocking pool.
///
/// Requires a running tokio runtime. This is the default resolver of
/// [`ProxyConnector`](crate::connect::ProxyConnector).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioResolver;

impl TokioResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for TokioResolver {
    async fn resolve(&self, host: &str) -> Result<ResolvedAddress, ResolveError> {
        validate_hostname(host)?;
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| ResolveError::lookup_failed(host, e))?;
        let resolved = select_address(host, addrs.map(|addr| addr.ip()))?;
        tracing::debug!(
            target: "sockhop::dns",
            host = %host,
            address = %resolved,
            "resolved via tokio"
        );
        Ok(resolved)
    }
}
