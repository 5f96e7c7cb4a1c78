//! Async proxy connector.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

use crate::config::{
    ConnectConfig, DestinationTarget, Origin, ProxyConfig, ProxyEndpoint, ProxyHop, ProxyType,
};
use crate::connect::session::NegotiationSession;
use crate::connect::tcp::{Dial, SocketOptions, TcpDialer};
use crate::connect::tls::{MaybeTlsStream, TlsConfig};
use crate::connect::transport::TokioStream;
use crate::dns::{Resolve, TokioResolver};
use crate::error::{self, Result};

use super::proxy_address;

/// Opens tunnels through a proxy route on tokio.
///
/// One connector serves any number of concurrent attempts; each attempt gets
/// its own socket and session.
#[derive(Debug, Clone)]
pub struct ProxyConnector<R = TokioResolver, D = TcpDialer> {
    route: Vec<ProxyHop>,
    resolver: R,
    dialer: D,
    config: ConnectConfig,
    tls: Option<TlsConfig>,
}

impl ProxyConnector {
    /// A single-hop connector with the tokio resolver and TCP dialer.
    pub fn new(proxy_type: ProxyType, endpoint: impl Into<Arc<ProxyEndpoint>>) -> Self {
        Self::from_hop(ProxyHop::new(proxy_type, endpoint))
    }

    #[must_use]
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::from_hop(config.hop())
    }

    /// # Errors
    ///
    /// See [`ProxyConfig::from_url`].
    pub fn from_url(url: &str) -> Result<Self> {
        ProxyConfig::from_url(url).map(|config| Self::from_config(&config))
    }

    fn from_hop(hop: ProxyHop) -> Self {
        Self {
            route: vec![hop],
            resolver: TokioResolver::new(),
            dialer: TcpDialer::new(),
            config: ConnectConfig::default(),
            tls: None,
        }
    }
}

impl<R, D> ProxyConnector<R, D> {
    /// Replaces the resolver used for proxy hosts and locally resolved destinations.
    pub fn with_resolver<R2: Resolve>(self, resolver: R2) -> ProxyConnector<R2, D> {
        ProxyConnector {
            route: self.route,
            resolver,
            dialer: self.dialer,
            config: self.config,
            tls: self.tls,
        }
    }

    /// Replaces how the socket to the first proxy is opened.
    pub fn with_dialer<D2: Dial>(self, dialer: D2) -> ProxyConnector<R, D2> {
        ProxyConnector {
            route: self.route,
            resolver: self.resolver,
            dialer,
            config: self.config,
            tls: self.tls,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ConnectConfig) -> Self {
        self.config = config;
        self
    }

    /// TLS settings for `https` origins. Defaults to webpki roots, HTTP/1.1 only.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Appends a hop reached through the current last hop.
    #[must_use]
    pub fn chain(mut self, hop: ProxyHop) -> Self {
        self.route.push(hop);
        self
    }

    #[must_use]
    pub fn route(&self) -> &[ProxyHop] {
        &self.route
    }

    #[must_use]
    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

impl<R: Resolve, D: Dial> ProxyConnector<R, D> {
    /// Opens a negotiated tunnel to `target`.
    ///
    /// # Errors
    ///
    /// `Timeout` when the deadline passes, `Connection` when the proxy is
    /// unreachable, `Proxy` when it refuses, `Resolve` and `Config` as raised
    /// by the negotiators.
    pub async fn connect(&self, target: &DestinationTarget) -> Result<D::Stream> {
        self.within_deadline(target, self.establish(target)).await
    }

    /// Opens a tunnel and runs a TLS handshake with `target` over it.
    ///
    /// The deadline covers the handshake too.
    ///
    /// # Errors
    ///
    /// As [`connect`](Self::connect), plus `Tls` for handshake failures.
    pub async fn connect_tls(
        &self,
        target: &DestinationTarget,
        tls: &TlsConfig,
    ) -> Result<TlsStream<D::Stream>> {
        let attempt = async {
            let stream = self.establish(target).await?;
            tls.connect_async(stream, target.host()).await
        };
        self.within_deadline(target, attempt).await
    }

    /// Connects to an origin, adding TLS for `https`.
    ///
    /// # Errors
    ///
    /// As [`connect_tls`](Self::connect_tls).
    pub async fn connect_origin(&self, origin: &Origin) -> Result<MaybeTlsStream<D::Stream>> {
        if !origin.requires_tls() {
            let stream = self.connect(origin.target()).await?;
            return Ok(MaybeTlsStream::Plain(stream));
        }
        let tls = match &self.tls {
            Some(tls) => tls.clone(),
            None => TlsConfig::builder().build()?,
        };
        let stream = self.connect_tls(origin.target(), &tls).await?;
        Ok(MaybeTlsStream::Tls(Box::new(stream)))
    }

    async fn establish(&self, target: &DestinationTarget) -> Result<D::Stream> {
        let first = self
            .route
            .first()
            .ok_or_else(|| error::config("Proxy route is empty"))?;
        let addr = proxy_address(&self.resolver, &first.endpoint).await?;

        tracing::debug!(
            target: "sockhop::proxy",
            proxy = %first.endpoint,
            proxy.addr = %addr,
            proxy.kind = %first.proxy_type,
            destination = %target,
            "connecting to proxy"
        );
        let socket = self.dialer.dial(addr).await.map_err(|e| {
            error::proxy_unreachable(first.endpoint.host(), first.endpoint.port(), e)
        })?;
        if let Err(e) = self.dialer.configure(&socket, SocketOptions::from(&self.config)) {
            tracing::debug!(target: "sockhop::proxy", error = %e, "failed to apply socket options");
        }

        let mut session = NegotiationSession::new(&self.route, target);
        session.attach(TokioStream::new(socket));
        let stream = session.negotiate(&self.resolver, &self.config).await?;
        Ok(stream.into_inner())
    }

    /// Bounds an attempt by the configured deadline. Expiry drops the attempt,
    /// which closes any socket it opened.
    async fn within_deadline<T>(
        &self,
        target: &DestinationTarget,
        attempt: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let Some(limit) = self.config.timeout else {
            return attempt.await;
        };
        match tokio::time::timeout(limit, attempt).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    target: "sockhop::proxy",
                    destination = %target,
                    timeout_ms = limit.as_millis() as u64,
                    error.kind = "timeout",
                    "proxy connection timed out"
                );
                Err(error::timeout(Some(limit)))
            }
        }
    }
}

/// Connects to `destination` through a single proxy.
///
/// `timeout` of `None` waits indefinitely.
///
/// # Errors
///
/// See [`ProxyConnector::connect`].
pub async fn connect_through_proxy(
    endpoint: &ProxyEndpoint,
    proxy_type: ProxyType,
    destination: &DestinationTarget,
    timeout: Option<Duration>,
) -> Result<TcpStream> {
    let config = ConnectConfig {
        timeout,
        ..ConnectConfig::default()
    };
    ProxyConnector::new(proxy_type, endpoint.clone())
        .with_config(config)
        .connect(destination)
        .await
}
