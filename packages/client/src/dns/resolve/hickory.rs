//! DNS resolution via the [hickory-resolver](https://github.com/hickory-dns/hickory-dns) crate.

use std::fmt;
use std::sync::{Arc, OnceLock};

use hickory_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::Resolver;

use super::traits::Resolve;
use super::types::{ResolveError, ResolvedAddress};
use super::utilities::{select_address, validate_hostname};

type AsyncResolver = Resolver<TokioConnectionProvider>;

/// Resolver backed by hickory's async stub resolver.
///
/// The underlying resolver is built on first use and shared between clones,
/// so its cache is shared too. Requires a running tokio runtime.
#[derive(Clone)]
pub struct HickoryResolver {
    config: ResolverConfig,
    opts: ResolverOpts,
    state: Arc<OnceLock<AsyncResolver>>,
}

impl HickoryResolver {
    /// Uses hickory's default upstream configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Uses an explicit upstream configuration.
    #[must_use]
    pub fn with_config(config: ResolverConfig) -> Self {
        Self::with_options(config, ResolverOpts::default())
    }

    /// Uses explicit upstreams and options (timeouts, hosts file, cache size).
    ///
    /// `ip_strategy` is always widened to both families.
    #[must_use]
    pub fn with_options(config: ResolverConfig, mut opts: ResolverOpts) -> Self {
        // Both families are requested; selection happens in `select_address`.
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        Self {
            config,
            opts,
            state: Arc::new(OnceLock::new()),
        }
    }

    fn resolver(&self) -> &AsyncResolver {
        self.state.get_or_init(|| {
            Resolver::builder_with_config(self.config.clone(), TokioConnectionProvider::default())
                .with_options(self.opts.clone())
                .build()
        })
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HickoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HickoryResolver")
            .field("initialized", &self.state.get().is_some())
            .finish()
    }
}

impl Resolve for HickoryResolver {
    async fn resolve(&self, host: &str) -> Result<ResolvedAddress, ResolveError> {
        validate_hostname(host)?;
        let lookup = self
            .resolver()
            .lookup_ip(host)
            .await
            .map_err(|e| ResolveError::lookup_failed(host, e))?;
        let resolved = select_address(host, lookup.iter())?;
        tracing::debug!(
            target: "sockhop::dns",
            host = %host,
            address = %resolved,
            "resolved via hickory"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    /// No upstream servers: anything answered comes from hickory itself.
    fn offline() -> HickoryResolver {
        HickoryResolver::with_options(ResolverConfig::new(), ResolverOpts::default())
    }

    #[tokio::test]
    async fn invalid_names_fail_before_the_resolver_is_built() {
        let resolver = offline();
        let err = resolver.resolve("").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidHostname(_)));
        assert!(resolver.state.get().is_none());
    }

    #[tokio::test]
    async fn localhost_resolves_without_upstreams() {
        let resolver = offline();
        let resolved = resolver.resolve("localhost").await.unwrap();
        assert_eq!(resolved.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(resolver.state.get().is_some());
    }

    #[tokio::test]
    async fn clones_share_one_resolver() {
        let resolver = offline();
        let clone = resolver.clone();
        clone.resolve("localhost").await.unwrap();
        assert!(format!("{resolver:?}").contains("initialized: true"));
    }

    #[test]
    fn options_always_request_both_families() {
        let mut opts = ResolverOpts::default();
        opts.ip_strategy = LookupIpStrategy::Ipv6Only;
        let resolver = HickoryResolver::with_options(ResolverConfig::new(), opts);
        assert_eq!(resolver.opts.ip_strategy, LookupIpStrategy::Ipv4AndIpv6);
    }
}
