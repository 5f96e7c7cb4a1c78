//! Proxy credentials and name-resolution policy.

use super::core::ProxyBuilder;

impl ProxyBuilder {
    /// Username and password for the proxy.
    ///
    /// SOCKS5 uses them only when both are non-empty; SOCKS4 sends the
    /// username as its user-id; HTTP CONNECT sends a Basic
    /// `Proxy-Authorization` header.
    ///
    /// # Examples
    /// ```no_run
    /// use sockhop::Proxy;
    ///
    /// let transport = Proxy::socks5("127.0.0.1", 1080)
    ///     .credentials("alice", "s3cret")
    ///     .build();
    /// ```
    pub fn credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let (username, password) = (username.into(), password.into());
        self.map_proxy(|proxy| proxy.credentials(username, password))
    }

    /// Username only, for SOCKS4 user-ids.
    pub fn username(self, username: impl Into<String>) -> Self {
        let username = username.into();
        self.map_proxy(|proxy| proxy.username(username))
    }

    /// Resolve destination names at the proxy (`true`) or locally (`false`).
    ///
    /// Defaults: SOCKS5 remote, SOCKS4 local. HTTP CONNECT always sends the
    /// name and records a warning if this is set.
    pub fn rdns(self, rdns: bool) -> Self {
        self.map_proxy(|proxy| proxy.rdns(rdns))
    }
}
