//! Transports keyed by request URI.
//!
//! An HTTP engine hands over the request URI and receives a stream already
//! tunnelled to the URI's origin, TLS-wrapped for `https`.

use http::Uri;
use tokio::net::TcpStream;

use sockhop_client::error;
use sockhop_client::{
    BlockingMaybeTlsStream, BlockingProxyConnector, BlockingResolve, GaiResolver, MaybeTlsStream,
    Origin, ProxyConnector, Resolve, Result, Scheme, TokioResolver,
};

/// Origin (scheme, host, port) of an absolute `http` or `https` URI.
///
/// Default ports are filled in and IPv6 brackets removed.
///
/// # Errors
///
/// `Config` when the URI has no scheme, another scheme, or no host.
pub fn origin_from_uri(uri: &Uri) -> Result<Origin> {
    let scheme = uri
        .scheme_str()
        .ok_or_else(|| error::config(format!("Request URI has no scheme: {uri}")))?;
    let scheme = Scheme::parse(scheme)?;
    let host = uri
        .host()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| error::config(format!("Request URI has no host: {uri}")))?;
    Ok(Origin::new(scheme, host, uri.port_u16()))
}

/// Async transport; one instance serves concurrent requests.
#[derive(Debug, Clone)]
pub struct AsyncProxyTransport<R = TokioResolver> {
    connector: ProxyConnector<R>,
}

impl<R> AsyncProxyTransport<R> {
    pub fn new(connector: ProxyConnector<R>) -> Self {
        Self { connector }
    }

    #[must_use]
    pub fn connector(&self) -> &ProxyConnector<R> {
        &self.connector
    }

    /// Replaces the resolver used for proxy hosts and locally resolved destinations.
    pub fn with_resolver<R2: Resolve>(self, resolver: R2) -> AsyncProxyTransport<R2> {
        AsyncProxyTransport {
            connector: self.connector.with_resolver(resolver),
        }
    }
}

impl<R: Resolve> AsyncProxyTransport<R> {
    /// Opens a tunnel to the origin of `uri`.
    ///
    /// # Errors
    ///
    /// `Config` for URIs without an `http`/`https` origin, otherwise as
    /// [`ProxyConnector::connect_origin`].
    pub async fn connect(&self, uri: &Uri) -> Result<MaybeTlsStream<TcpStream>> {
        let origin = origin_from_uri(uri)?;
        tracing::debug!(target: "sockhop::transport", origin = %origin, "opening proxied connection");
        self.connector.connect_origin(&origin).await
    }
}

/// Blocking transport; never needs a runtime.
#[derive(Debug, Clone)]
pub struct BlockingProxyTransport<R = GaiResolver> {
    connector: BlockingProxyConnector<R>,
}

impl<R> BlockingProxyTransport<R> {
    pub fn new(connector: BlockingProxyConnector<R>) -> Self {
        Self { connector }
    }

    #[must_use]
    pub fn connector(&self) -> &BlockingProxyConnector<R> {
        &self.connector
    }

    pub fn with_resolver<R2: BlockingResolve>(self, resolver: R2) -> BlockingProxyTransport<R2> {
        BlockingProxyTransport {
            connector: self.connector.with_resolver(resolver),
        }
    }
}

impl<R: BlockingResolve> BlockingProxyTransport<R> {
    /// Opens a tunnel to the origin of `uri`, blocking.
    ///
    /// # Errors
    ///
    /// As [`AsyncProxyTransport::connect`].
    pub fn connect(&self, uri: &Uri) -> Result<BlockingMaybeTlsStream> {
        let origin = origin_from_uri(uri)?;
        tracing::debug!(target: "sockhop::transport", origin = %origin, "opening proxied connection");
        self.connector.connect_origin(&origin)
    }
}
