//! Proxy connection establishment
//!
//! Transport abstraction, negotiators, the per-attempt session, the TLS leg
//! and the two connectors that tie them together.

pub mod negotiate;
pub mod service;
pub mod session;
pub mod tcp;
pub mod tls;
pub mod transport;

pub use negotiate::{
    HttpConnectNegotiator, NegotiationState, Negotiator, Socks4Negotiator, Socks5Negotiator,
    create_negotiator, create_negotiator_from_name,
};
pub use service::{BlockingProxyConnector, ProxyConnector, blocking, connect_through_proxy};
pub use session::NegotiationSession;
pub use tcp::{Dial, TcpDialer};
pub use tls::{
    BlockingMaybeTlsStream, BlockingTlsStream, CertificateDer, ClientIdentity, MaybeTlsStream,
    PrivateKeyDer, RootSource, TlsConfig,
};
pub use transport::{BlockingStream, ByteStream, DeadlineIo, SyncSocket, TokioStream};
