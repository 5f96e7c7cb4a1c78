//! Connection, TLS and routing options.

use std::time::Duration;

use sockhop_client::connect::RootSource;
use sockhop_client::{ClientIdentity, ProxyConfig, TlsConfig};

use super::core::ProxyBuilder;

impl ProxyBuilder {
    /// Deadline for the whole attempt: DNS, proxy connect, every hop's
    /// handshake and the TLS handshake. Defaults to 30 seconds.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect = self.connect.with_timeout(timeout);
        self
    }

    /// Waits indefinitely.
    pub fn no_connect_timeout(mut self) -> Self {
        self.connect = self.connect.without_timeout();
        self
    }

    /// `TCP_NODELAY` on the proxy socket. On by default.
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.connect = self.connect.with_nodelay(enabled);
        self
    }

    /// TCP keepalive on the proxy socket, starting after `idle`.
    pub fn keepalive(mut self, idle: Duration) -> Self {
        self.connect = self.connect.with_keepalive(idle);
        self
    }

    /// Largest CONNECT response head accepted from an HTTP proxy.
    pub fn max_response_header_bytes(mut self, limit: usize) -> Self {
        self.connect = self.connect.with_max_response_header_bytes(limit);
        self
    }

    /// Offer `h2` via ALPN on `https` origins.
    pub fn http2(mut self, enabled: bool) -> Self {
        self.tls.http2 = enabled;
        self
    }

    /// Trust the platform certificate store instead of the bundled roots.
    pub fn native_roots(mut self, enabled: bool) -> Self {
        self.tls.roots = if enabled {
            RootSource::Native
        } else {
            RootSource::Webpki
        };
        self
    }

    /// Accept any server certificate on `https` origins.
    ///
    /// Hostname and chain checks are skipped, so anyone on the path can
    /// impersonate the origin. Off by default.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.tls.accept_invalid_certs = accept;
        self
    }

    /// Client certificate and key offered to `https` origins that ask for one.
    ///
    /// ```no_run
    /// use sockhop::{ClientIdentity, Proxy};
    ///
    /// # fn main() -> sockhop::Result<()> {
    /// let identity = ClientIdentity::from_pem(
    ///     &std::fs::read("client.pem").unwrap(),
    ///     &std::fs::read("client.key").unwrap(),
    /// )?;
    /// let transport = Proxy::socks5("127.0.0.1", 1080).identity(identity).build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn identity(mut self, identity: ClientIdentity) -> Self {
        self.tls.identity = Some(identity);
        self
    }

    /// Use a caller-built TLS configuration. Overrides `http2`,
    /// `native_roots`, `danger_accept_invalid_certs` and `identity`.
    pub fn tls_config(mut self, tls: TlsConfig) -> Self {
        self.tls.custom = Some(tls);
        self
    }

    /// Adds a hop reached through the proxies configured so far.
    ///
    /// ```no_run
    /// use sockhop::Proxy;
    ///
    /// // client -> corporate HTTP proxy -> SOCKS5 exit -> origin
    /// let transport = Proxy::http("proxy.corp", 3128)
    ///     .via("socks5h://exit.example:1080")
    ///     .build();
    /// ```
    pub fn via(mut self, url: &str) -> Self {
        self.hops.push(ProxyConfig::from_url(url).map(|config| config.hop()));
        self
    }
}
