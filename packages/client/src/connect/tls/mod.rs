//! TLS for the destination leg.
//!
//! The tunnel is TLS-wrapped after negotiation, with the destination host as
//! SNI and verification name. The proxy itself is always reached in cleartext.

mod config;
mod stream;
mod verify;

pub use config::{ClientIdentity, RootSource, TlsConfig, TlsConfigBuilder};
pub use rustls::pki_types::{CertificateDer, PrivateKeyDer};
pub use stream::{BlockingMaybeTlsStream, BlockingTlsStream, MaybeTlsStream};
