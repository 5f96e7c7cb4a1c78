//! rustls client configuration and handshakes.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::error::{self, Result};

use super::verify::AcceptAnyServerCert;

const ALPN_H2: &[u8] = b"h2";
const ALPN_HTTP11: &[u8] = b"http/1.1";

/// Where trust anchors come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootSource {
    /// Mozilla's root program, compiled in via `webpki-roots`.
    #[default]
    Webpki,
    /// The platform certificate store, via `rustls-native-certs`.
    Native,
}

/// Shared rustls client configuration.
#[derive(Clone)]
pub struct TlsConfig {
    client_config: Arc<ClientConfig>,
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("alpn_protocols", &self.client_config.alpn_protocols)
            .finish_non_exhaustive()
    }
}

impl TlsConfig {
    #[must_use]
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }

    /// Uses a caller-built rustls configuration as is.
    #[must_use]
    pub fn from_client_config(client_config: Arc<ClientConfig>) -> Self {
        Self { client_config }
    }

    #[must_use]
    pub fn client_config(&self) -> &Arc<ClientConfig> {
        &self.client_config
    }

    /// Completes a TLS handshake over a blocking stream.
    ///
    /// Bounded only by whatever socket timeouts are armed on `stream`; see
    /// [`handshake_blocking`](Self::handshake_blocking) for per-call bounds.
    ///
    /// # Errors
    ///
    /// `Tls` for invalid server names and handshake failures, `Timeout` when
    /// the socket times out.
    pub fn connect_blocking<S: Read + Write>(
        &self,
        mut stream: S,
        server_name: &str,
    ) -> Result<StreamOwned<ClientConnection, S>> {
        let conn = self.handshake_blocking(&mut stream, server_name)?;
        Ok(StreamOwned::new(conn, stream))
    }

    /// Drives a client handshake over `io` and returns the established
    /// connection state.
    ///
    /// Every read and write goes through `io`, so an adapter that re-arms a
    /// deadline per call bounds the whole handshake, not just each read.
    ///
    /// # Errors
    ///
    /// `Tls` for invalid server names and handshake failures, `Timeout` when
    /// `io` reports `TimedOut` or `WouldBlock`.
    pub fn handshake_blocking<S: Read + Write>(
        &self,
        io: &mut S,
        server_name: &str,
    ) -> Result<ClientConnection> {
        let name = server_name_for(server_name)?;
        let mut conn = ClientConnection::new(Arc::clone(&self.client_config), name)
            .map_err(|e| error::tls(server_name, io::Error::other(e)))?;

        while conn.is_handshaking() {
            conn.complete_io(&mut *io).map_err(|e| match e.kind() {
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => error::timeout(None),
                _ => error::tls(server_name, e),
            })?;
        }
        tracing::debug!(
            target: "sockhop::tls",
            server_name = %server_name,
            alpn = ?conn.alpn_protocol().map(String::from_utf8_lossy),
            "TLS handshake complete"
        );
        Ok(conn)
    }

    /// Performs a TLS handshake over an async stream.
    ///
    /// # Errors
    ///
    /// `Tls` for invalid server names and handshake failures.
    pub async fn connect_async<S>(&self, stream: S, server_name: &str) -> Result<TlsStream<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let name = server_name_for(server_name)?;
        let connector = TlsConnector::from(Arc::clone(&self.client_config));
        let tls = connector
            .connect(name, stream)
            .await
            .map_err(|e| error::tls(server_name, e))?;
        tracing::debug!(
            target: "sockhop::tls",
            server_name = %server_name,
            alpn = ?tls.get_ref().1.alpn_protocol().map(String::from_utf8_lossy),
            "TLS handshake complete"
        );
        Ok(tls)
    }
}

fn server_name_for(host: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(host.to_owned())
        .map_err(|e| error::tls(host, io::Error::new(io::ErrorKind::InvalidInput, e)))
}

/// Certificate chain and private key presented when the server asks for a
/// client certificate.
pub struct ClientIdentity {
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl ClientIdentity {
    /// `chain` starts with the end-entity certificate.
    #[must_use]
    pub fn new(chain: Vec<CertificateDer<'static>>, key: PrivateKeyDer<'static>) -> Self {
        Self { chain, key }
    }

    /// Parses a PEM certificate chain and a PEM private key (PKCS#8, PKCS#1 or SEC1).
    ///
    /// # Errors
    ///
    /// `Config` when either input is malformed or holds no usable item.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self> {
        let chain = CertificateDer::pem_slice_iter(cert_pem)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| error::config(format!("Invalid client certificate PEM: {e}")))?;
        if chain.is_empty() {
            return Err(error::config("Client certificate PEM holds no certificates"));
        }
        let key = PrivateKeyDer::from_pem_slice(key_pem)
            .map_err(|e| error::config(format!("Invalid client key PEM: {e}")))?;
        Ok(Self::new(chain, key))
    }

    #[must_use]
    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }
}

impl Clone for ClientIdentity {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            key: self.key.clone_key(),
        }
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("certificates", &self.chain.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`TlsConfig`].
#[derive(Debug, Clone, Default)]
#[must_use = "builders do nothing until `build` is called"]
pub struct TlsConfigBuilder {
    roots: RootSource,
    http2: bool,
    accept_invalid_certs: bool,
    identity: Option<ClientIdentity>,
}

impl TlsConfigBuilder {
    pub fn roots(mut self, roots: RootSource) -> Self {
        self.roots = roots;
        self
    }

    /// Offer `h2` before `http/1.1` in ALPN.
    pub fn http2(mut self, enabled: bool) -> Self {
        self.http2 = enabled;
        self
    }

    /// Skip certificate chain and hostname verification.
    ///
    /// Any server certificate is accepted, so the connection can be
    /// intercepted. Handshake signatures are still checked.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Present `identity` when the server requests a client certificate.
    pub fn identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Builds the rustls configuration with the ring provider.
    ///
    /// # Errors
    ///
    /// `Config` if the provider rejects the default protocol versions or the
    /// client identity.
    pub fn build(self) -> Result<TlsConfig> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| error::config(format!("TLS configuration rejected: {e}")))?;

        let builder = if self.accept_invalid_certs {
            tracing::warn!(target: "sockhop::tls", "certificate verification disabled");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
        } else {
            builder.with_root_certificates(root_store(self.roots))
        };

        let mut client_config = match self.identity {
            Some(identity) => builder
                .with_client_auth_cert(identity.chain, identity.key)
                .map_err(|e| error::config(format!("Client certificate rejected: {e}")))?,
            None => builder.with_no_client_auth(),
        };

        client_config.alpn_protocols = if self.http2 {
            vec![ALPN_H2.to_vec(), ALPN_HTTP11.to_vec()]
        } else {
            vec![ALPN_HTTP11.to_vec()]
        };

        Ok(TlsConfig::from_client_config(Arc::new(client_config)))
    }
}

fn root_store(source: RootSource) -> RootCertStore {
    let mut roots = RootCertStore::empty();
    if source == RootSource::Native {
        let loaded = rustls_native_certs::load_native_certs();
        for err in &loaded.errors {
            tracing::warn!(target: "sockhop::tls", error = %err, "certificate load error");
        }
        let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
        tracing::debug!(target: "sockhop::tls", added, ignored, "loaded platform certificates");
    }
    if roots.is_empty() {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }
    roots
}
