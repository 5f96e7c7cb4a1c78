//! Proxy handshakes.
//!
//! Each negotiator speaks one wire protocol over a [`ByteStream`] and knows
//! nothing about sockets, deadlines or the blocking/async split. A handshake
//! has two phases, [`authenticate`](Negotiator::authenticate) and
//! [`request`](Negotiator::request); the session drives them in order.

mod http_connect;
mod socks4;
mod socks5;

use crate::config::{ConnectConfig, DestinationTarget, ProxyEndpoint, ProxyType};
use crate::dns::Resolve;
use crate::error::{self, Result};

use super::transport::ByteStream;

pub use http_connect::HttpConnectNegotiator;
pub use socks4::Socks4Negotiator;
pub use socks5::{Socks5Negotiator, TargetAddress};

/// Progress of one negotiation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    /// No socket yet.
    Unconnected,
    /// Socket open to the proxy, or previous hop done and the next one not yet authenticated.
    ProxyConnected,
    /// Authentication phase of the current hop finished.
    Authenticated,
    /// Tunnel to the destination established.
    Negotiated,
    /// Terminal failure; the transport has been closed.
    Failed,
}

impl NegotiationState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NegotiationState::Unconnected => "unconnected",
            NegotiationState::ProxyConnected => "proxy_connected",
            NegotiationState::Authenticated => "authenticated",
            NegotiationState::Negotiated => "negotiated",
            NegotiationState::Failed => "failed",
        }
    }
}

/// A negotiator for one of the supported proxy protocols.
#[derive(Debug, Clone)]
pub enum Negotiator {
    Socks4(Socks4Negotiator),
    Socks5(Socks5Negotiator),
    Http(HttpConnectNegotiator),
}

impl Negotiator {
    /// Builds the negotiator for `proxy_type`, configured from `endpoint`.
    #[must_use]
    pub fn new(proxy_type: ProxyType, endpoint: &ProxyEndpoint) -> Self {
        match proxy_type {
            ProxyType::Socks4 => Negotiator::Socks4(Socks4Negotiator::from_endpoint(endpoint)),
            ProxyType::Socks5 => Negotiator::Socks5(Socks5Negotiator::from_endpoint(endpoint)),
            ProxyType::Http => Negotiator::Http(HttpConnectNegotiator::from_endpoint(endpoint)),
        }
    }

    /// Applies the buffer and header limits of `config`.
    #[must_use]
    pub fn with_limits(self, config: &ConnectConfig) -> Self {
        match self {
            Negotiator::Socks5(inner) => {
                Negotiator::Socks5(inner.with_read_buffer_size(config.read_buffer_size))
            }
            Negotiator::Http(inner) => {
                Negotiator::Http(inner.with_max_header_bytes(config.max_response_header_bytes))
            }
            socks4 @ Negotiator::Socks4(_) => socks4,
        }
    }

    #[must_use]
    pub fn proxy_type(&self) -> ProxyType {
        match self {
            Negotiator::Socks4(_) => ProxyType::Socks4,
            Negotiator::Socks5(_) => ProxyType::Socks5,
            Negotiator::Http(_) => ProxyType::Http,
        }
    }

    /// Runs the authentication phase. SOCKS4 and HTTP CONNECT carry their
    /// credentials in the request, so only SOCKS5 does work here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Proxy`](crate::Error::Proxy) when the proxy rejects
    /// the offered methods or credentials, and transport errors unchanged.
    pub async fn authenticate<S: ByteStream>(&self, stream: &mut S) -> Result<()> {
        match self {
            Negotiator::Socks5(inner) => inner.authenticate(stream).await,
            Negotiator::Socks4(_) | Negotiator::Http(_) => Ok(()),
        }
    }

    /// Asks the proxy to open a tunnel to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Proxy`](crate::Error::Proxy) when the proxy refuses,
    /// [`Error::Config`](crate::Error::Config) when the target cannot be
    /// expressed in this protocol, [`Error::Resolve`](crate::Error::Resolve)
    /// when local resolution fails, and transport errors unchanged.
    pub async fn request<S: ByteStream, R: Resolve>(
        &self,
        stream: &mut S,
        resolver: &R,
        target: &DestinationTarget,
    ) -> Result<()> {
        match self {
            Negotiator::Socks4(inner) => inner.request(stream, resolver, target).await,
            Negotiator::Socks5(inner) => inner.request(stream, resolver, target).await,
            Negotiator::Http(inner) => inner.request(stream, target).await,
        }
    }

    /// Both phases back to back.
    ///
    /// # Errors
    ///
    /// See [`authenticate`](Self::authenticate) and [`request`](Self::request).
    pub async fn negotiate<S: ByteStream, R: Resolve>(
        &self,
        stream: &mut S,
        resolver: &R,
        target: &DestinationTarget,
    ) -> Result<()> {
        self.authenticate(stream).await?;
        self.request(stream, resolver, target).await
    }
}

/// Builds the negotiator for a proxy type and endpoint.
#[must_use]
pub fn create_negotiator(proxy_type: ProxyType, endpoint: &ProxyEndpoint) -> Negotiator {
    Negotiator::new(proxy_type, endpoint)
}

/// Builds a negotiator from a textual proxy type such as `"socks5"`.
///
/// # Errors
///
/// Returns `Config("Invalid proxy type: …")` for unknown names.
pub fn create_negotiator_from_name(name: &str, endpoint: &ProxyEndpoint) -> Result<Negotiator> {
    let proxy_type: ProxyType = name.parse()?;
    Ok(create_negotiator(proxy_type, endpoint))
}

/// ASCII form of a destination domain: IDNA-encoded when it contains
/// non-ASCII characters.
pub(crate) fn ascii_domain(host: &str) -> Result<String> {
    let ascii = if host.is_ascii() {
        host.to_owned()
    } else {
        match url::Host::parse(host) {
            Ok(url::Host::Domain(domain)) => domain,
            _ => return Err(error::config(format!("Invalid destination hostname: {host}"))),
        }
    };
    if ascii.is_empty() || ascii.bytes().any(|b| b == 0 || b.is_ascii_whitespace()) {
        return Err(error::config(format!("Invalid destination hostname: {ascii:?}")));
    }
    Ok(ascii)
}
