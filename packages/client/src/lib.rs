//! # sockhop client
//!
//! Proxy negotiation engine for HTTP clients. Given a proxy (HTTP CONNECT,
//! SOCKS4/4a or SOCKS5) and a destination, it opens the proxy socket, runs
//! the handshake and hands back a byte stream that behaves like a direct
//! connection to the destination, optionally wrapped in TLS.
//!
//! ## Features
//!
//! - **Three protocols** written once over a transport trait
//! - **Blocking and tokio** connectors with identical behaviour and errors
//! - **Local or remote DNS** per proxy, with pluggable resolvers
//! - **One deadline** covering DNS, proxy connect and the whole handshake
//! - **Rustls** for the destination leg, with ALPN for HTTP/2
//!
//! ## Usage
//!
//! ```no_run
//! use sockhop_client::{DestinationTarget, ProxyConnector};
//!
//! # async fn run() -> sockhop_client::Result<()> {
//! let connector = ProxyConnector::from_url("socks5h://127.0.0.1:1080")?;
//! let stream = connector.connect(&DestinationTarget::new("example.com", 80)).await?;
//! # drop(stream);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod connect;
pub mod dns;
pub mod error;
pub mod prelude;

pub use config::{
    ConfigWarning, ConnectConfig, Credentials, DestinationTarget, Origin, ProxyConfig,
    ProxyConfigBuilder, ProxyEndpoint, ProxyHop, ProxyType, Scheme,
};
pub use connect::{
    BlockingMaybeTlsStream, BlockingProxyConnector, ByteStream, ClientIdentity, Dial,
    MaybeTlsStream, NegotiationSession, NegotiationState, Negotiator, ProxyConnector, TlsConfig,
    blocking, connect_through_proxy, create_negotiator,
};
pub use dns::{
    AddressFamily, BlockingResolve, GaiResolver, HickoryResolver, HostKind, Resolve, ResolveError,
    ResolvedAddress, StaticResolver, TokioResolver, classify,
};
pub use error::{Error, Result};
