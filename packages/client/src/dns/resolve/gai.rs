//! System resolver (`getaddrinfo`) through `std::net::ToSocketAddrs`.

use std::net::ToSocketAddrs;

use super::traits::{BlockingResolve, Resolve};
use super::types::{ResolveError, ResolvedAddress};
use super::utilities::{select_address, validate_hostname};

/// Resolves with the operating system's `getaddrinfo`.
///
/// The lookup blocks the calling thread. It is the default for the blocking
/// connector; async callers should prefer [`TokioResolver`](super::TokioResolver)
/// or [`HickoryResolver`](super::HickoryResolver).
#[derive(Debug, Clone, Copy, Default)]
pub struct GaiResolver;

impl GaiResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Performs the lookup on the current thread.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if the system lookup fails or returns nothing.
    pub fn resolve_blocking(&self, host: &str) -> Result<ResolvedAddress, ResolveError> {
        validate_hostname(host)?;
        let addrs = (host, 0)
            .to_socket_addrs()
            .map_err(|e| ResolveError::lookup_failed(host, e))?;
        let resolved = select_address(host, addrs.map(|addr| addr.ip()))?;
        tracing::debug!(
            target: "sockhop::dns",
            host = %host,
            address = %resolved,
            "resolved via getaddrinfo"
        );
        Ok(resolved)
    }
}

impl Resolve for GaiResolver {
    async fn resolve(&self, host: &str) -> Result<ResolvedAddress, ResolveError> {
        self.resolve_blocking(host)
    }
}

impl BlockingResolve for GaiResolver {}
