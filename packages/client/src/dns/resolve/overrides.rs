//! In-memory resolver with hostname overrides.
//!
//! Used for tests and custom routing: lookups never leave the process and
//! every call is counted, so callers can assert that literal hosts were never
//! sent to a resolver.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::traits::{BlockingResolve, Resolve};
use super::types::{ResolveError, ResolvedAddress};
use super::utilities::select_address;

/// Resolver answering from a fixed host table.
///
/// Clones share the lookup counter.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    overrides: HashMap<String, Vec<IpAddr>>,
    lookups: Arc<AtomicUsize>,
}

impl StaticResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the addresses returned for `host`. Matching ignores case.
    #[must_use]
    pub fn with_host(mut self, host: &str, addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        self.overrides
            .insert(host.to_ascii_lowercase(), addrs.into_iter().collect());
        self
    }

    /// Number of `resolve` calls made so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn lookup(&self, host: &str) -> Result<ResolvedAddress, ResolveError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let addrs = self
            .overrides
            .get(&host.to_ascii_lowercase())
            .ok_or_else(|| ResolveError::no_addresses(host))?;
        select_address(host, addrs.iter().copied())
    }
}

impl Resolve for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<ResolvedAddress, ResolveError> {
        self.lookup(host)
    }
}

impl BlockingResolve for StaticResolver {}
