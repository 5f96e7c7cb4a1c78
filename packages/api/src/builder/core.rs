//! Core `ProxyBuilder` state and the build step.

use sockhop_client::connect::RootSource;
use sockhop_client::{
    BlockingProxyConnector, ClientIdentity, ConnectConfig, ProxyConfig, ProxyConfigBuilder, ProxyConnector,
    ProxyHop, ProxyType, Resolve, Result, TlsConfig,
};

use crate::transport::{AsyncProxyTransport, BlockingProxyTransport};

/// TLS settings for `https` origins.
#[derive(Debug, Clone, Default)]
pub(crate) struct TlsOptions {
    pub(crate) http2: bool,
    pub(crate) roots: RootSource,
    pub(crate) accept_invalid_certs: bool,
    pub(crate) identity: Option<ClientIdentity>,
    pub(crate) custom: Option<TlsConfig>,
}

/// Builds an [`AsyncProxyTransport`] or a [`BlockingProxyTransport`].
///
/// Every setter returns `Self`. Invalid input (a bad URL, an empty host) is
/// stored and surfaces from `build`, so chains never need `?` midway.
#[derive(Debug)]
#[must_use = "builders do nothing until `build` is called"]
pub struct ProxyBuilder {
    pub(crate) proxy: Result<ProxyConfigBuilder>,
    pub(crate) hops: Vec<Result<ProxyHop>>,
    pub(crate) connect: ConnectConfig,
    pub(crate) tls: TlsOptions,
}

impl ProxyBuilder {
    pub fn new(proxy_type: ProxyType, host: impl Into<String>, port: u16) -> Self {
        Self::from_parts(Ok(ProxyConfigBuilder::new(proxy_type).host(host).port(port)))
    }

    /// Starts from a proxy URL. Parse errors are reported by `build`.
    pub fn from_url(url: &str) -> Self {
        Self::from_parts(ProxyConfigBuilder::from_url(url))
    }

    fn from_parts(proxy: Result<ProxyConfigBuilder>) -> Self {
        Self {
            proxy,
            hops: Vec::new(),
            connect: ConnectConfig::default(),
            tls: TlsOptions::default(),
        }
    }

    /// Applies `f` to the proxy settings unless an earlier step failed.
    pub(crate) fn map_proxy(
        mut self,
        f: impl FnOnce(ProxyConfigBuilder) -> ProxyConfigBuilder,
    ) -> Self {
        self.proxy = self.proxy.map(f);
        self
    }

    /// Async transport for use on a tokio runtime.
    ///
    /// # Errors
    ///
    /// The first configuration error recorded by any setter, or a TLS
    /// configuration that rustls rejects.
    pub fn build(self) -> Result<AsyncProxyTransport> {
        let (config, hops, connect, tls) = self.into_parts()?;
        let connector = hops.into_iter().fold(
            ProxyConnector::from_config(&config)
                .with_config(connect)
                .with_tls(tls),
            ProxyConnector::chain,
        );
        Ok(AsyncProxyTransport::new(connector))
    }

    /// Async transport that resolves proxy hosts and local destinations with
    /// `resolver`, for example a [`HickoryResolver`](sockhop_client::HickoryResolver).
    ///
    /// # Errors
    ///
    /// As [`build`](Self::build).
    pub fn build_with_resolver<R: Resolve>(self, resolver: R) -> Result<AsyncProxyTransport<R>> {
        self.build().map(|transport| transport.with_resolver(resolver))
    }

    /// Transport that blocks the calling thread.
    ///
    /// # Errors
    ///
    /// As [`build`](Self::build).
    pub fn build_blocking(self) -> Result<BlockingProxyTransport> {
        let (config, hops, connect, tls) = self.into_parts()?;
        let connector = hops.into_iter().fold(
            BlockingProxyConnector::from_config(&config)
                .with_config(connect)
                .with_tls(tls),
            BlockingProxyConnector::chain,
        );
        Ok(BlockingProxyTransport::new(connector))
    }

    fn into_parts(self) -> Result<(ProxyConfig, Vec<ProxyHop>, ConnectConfig, TlsConfig)> {
        let config = self.proxy?.build()?;
        let hops = self.hops.into_iter().collect::<Result<Vec<_>>>()?;
        let tls = match self.tls.custom {
            Some(tls) => tls,
            None => {
                let builder = TlsConfig::builder()
                    .roots(self.tls.roots)
                    .http2(self.tls.http2)
                    .danger_accept_invalid_certs(self.tls.accept_invalid_certs);
                match self.tls.identity {
                    Some(identity) => builder.identity(identity).build()?,
                    None => builder.build()?,
                }
            }
        };

        tracing::debug!(
            target: "sockhop::builder",
            proxy = %config.endpoint(),
            proxy.kind = %config.proxy_type(),
            extra_hops = hops.len(),
            timeout = ?self.connect.timeout,
            "proxy transport configured"
        );
        Ok((config, hops, self.connect, tls))
    }
}
