//! Blocking proxy connector.
//!
//! Runs the same negotiators as the async connector, driven by
//! `futures::executor::block_on` over a [`BlockingStream`] whose operations
//! complete synchronously. No tokio runtime is needed or started.

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::executor::block_on;
use rustls::StreamOwned;
use socket2::SockRef;

use crate::config::{
    ConnectConfig, DestinationTarget, Origin, ProxyConfig, ProxyEndpoint, ProxyHop, ProxyType,
};
use crate::connect::session::NegotiationSession;
use crate::connect::tcp::{SocketOptions, configure_tcp_socket};
use crate::connect::tls::{BlockingMaybeTlsStream, BlockingTlsStream, TlsConfig};
use crate::connect::transport::BlockingStream;
use crate::dns::{BlockingResolve, GaiResolver};
use crate::error::{self, Error, Result};

use super::proxy_address;

/// Opens tunnels through a proxy route, blocking the calling thread.
///
/// Socket operations are bounded by the connect deadline. Name lookups are
/// not: a system resolver call cannot be interrupted, so the deadline is
/// checked as soon as it returns and the attempt fails with `Timeout` before
/// any further I/O.
#[derive(Debug, Clone)]
pub struct BlockingProxyConnector<R = GaiResolver> {
    route: Vec<ProxyHop>,
    resolver: R,
    config: ConnectConfig,
    tls: Option<TlsConfig>,
}

impl BlockingProxyConnector {
    /// A single-hop connector using the system resolver.
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
            resolver: GaiResolver::new(),
            config: ConnectConfig::default(),
            tls: None,
        }
    }
}

impl<R> BlockingProxyConnector<R> {
    /// Replaces the resolver. Only resolvers that never need a runtime qualify.
    pub fn with_resolver<R2: BlockingResolve>(self, resolver: R2) -> BlockingProxyConnector<R2> {
        BlockingProxyConnector {
            route: self.route,
            resolver,
            config: self.config,
            tls: self.tls,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ConnectConfig) -> Self {
        self.config = config;
        self
    }

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

impl<R: BlockingResolve> BlockingProxyConnector<R> {
    /// Opens a negotiated tunnel to `target`.
    ///
    /// The returned socket has no read or write timeouts set.
    ///
    /// # Errors
    ///
    /// `Timeout` when the deadline passes, `Connection` when the proxy is
    /// unreachable, `Proxy` when it refuses, `Resolve` and `Config` as raised
    /// by the negotiators.
    pub fn connect(&self, target: &DestinationTarget) -> Result<TcpStream> {
        let deadline = self.deadline();
        self.establish(target, deadline)?.into_inner()
    }

    /// Opens a tunnel and completes a TLS handshake with `target` over it.
    ///
    /// The handshake is bounded by the same deadline as the negotiation: the
    /// remaining budget is re-armed before every socket read and write.
    ///
    /// # Errors
    ///
    /// As [`connect`](Self::connect), plus `Tls` for handshake failures.
    pub fn connect_tls(&self, target: &DestinationTarget, tls: &TlsConfig) -> Result<BlockingTlsStream> {
        let deadline = self.deadline();
        let mut stream = self.establish(target, deadline)?;

        let conn = tls
            .handshake_blocking(&mut stream.deadline_io(), target.host())
            .map_err(|e| match e {
                Error::Timeout { .. } => {
                    tracing::warn!(
                        target: "sockhop::tls",
                        destination = %target,
                        error.kind = "timeout",
                        "TLS handshake timed out"
                    );
                    error::timeout(self.config.timeout)
                }
                other => other,
            })?;
        Ok(StreamOwned::new(conn, stream.into_inner()?))
    }

    /// Connects to an origin, adding TLS for `https`.
    ///
    /// # Errors
    ///
    /// As [`connect_tls`](Self::connect_tls).
    pub fn connect_origin(&self, origin: &Origin) -> Result<BlockingMaybeTlsStream> {
        if !origin.requires_tls() {
            return self.connect(origin.target()).map(BlockingMaybeTlsStream::Plain);
        }
        let tls = match &self.tls {
            Some(tls) => tls.clone(),
            None => TlsConfig::builder().build()?,
        };
        let stream = self.connect_tls(origin.target(), &tls)?;
        Ok(BlockingMaybeTlsStream::Tls(Box::new(stream)))
    }

    fn deadline(&self) -> Option<Instant> {
        self.config.timeout.map(|timeout| Instant::now() + timeout)
    }

    fn remaining(&self, deadline: Option<Instant>) -> Result<Option<Duration>> {
        let Some(deadline) = deadline else {
            return Ok(None);
        };
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(error::timeout(self.config.timeout));
        }
        Ok(Some(left))
    }

    fn establish(
        &self,
        target: &DestinationTarget,
        deadline: Option<Instant>,
    ) -> Result<BlockingStream<TcpStream>> {
        let result = self.open_and_negotiate(target, deadline);
        if let Err(e) = &result {
            if e.is_timeout() {
                tracing::warn!(
                    target: "sockhop::proxy",
                    destination = %target,
                    error.kind = "timeout",
                    "proxy connection timed out"
                );
            }
        }
        result
    }

    fn open_and_negotiate(
        &self,
        target: &DestinationTarget,
        deadline: Option<Instant>,
    ) -> Result<BlockingStream<TcpStream>> {
        let first = self
            .route
            .first()
            .ok_or_else(|| error::config("Proxy route is empty"))?;
        let addr = block_on(proxy_address(&self.resolver, &first.endpoint))?;
        self.remaining(deadline)?;

        tracing::debug!(
            target: "sockhop::proxy",
            proxy = %first.endpoint,
            proxy.addr = %addr,
            proxy.kind = %first.proxy_type,
            destination = %target,
            "connecting to proxy"
        );
        let socket = self.open_socket(first, addr, deadline)?;
        if let Err(e) = configure_tcp_socket(SockRef::from(&socket), SocketOptions::from(&self.config)) {
            tracing::debug!(target: "sockhop::proxy", error = %e, "failed to apply socket options");
        }

        let mut session = NegotiationSession::new(&self.route, target);
        session.attach(BlockingStream::new(socket, deadline, self.config.timeout));
        block_on(session.negotiate(&self.resolver, &self.config))
    }

    fn open_socket(&self, hop: &ProxyHop, addr: SocketAddr, deadline: Option<Instant>) -> Result<TcpStream> {
        let connected = match self.remaining(deadline)? {
            Some(budget) => TcpStream::connect_timeout(&addr, budget),
            None => TcpStream::connect(addr),
        };
        connected.map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock if deadline.is_some() => {
                error::timeout(self.config.timeout)
            }
            _ => error::proxy_unreachable(hop.endpoint.host(), hop.endpoint.port(), e),
        })
    }
}

/// Connects to `destination` through a single proxy, blocking.
///
/// `timeout` of `None` waits indefinitely.
///
/// # Errors
///
/// See [`BlockingProxyConnector::connect`].
pub fn connect_through_proxy(
    endpoint: &ProxyEndpoint,
    proxy_type: ProxyType,
    destination: &DestinationTarget,
    timeout: Option<Duration>,
) -> Result<TcpStream> {
    let config = ConnectConfig {
        timeout,
        ..ConnectConfig::default()
    };
    BlockingProxyConnector::new(proxy_type, endpoint.clone())
        .with_config(config)
        .connect(destination)
}
