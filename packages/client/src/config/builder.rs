//! Validated proxy configuration.
//!
//! [`ProxyConfigBuilder`] collects settings from code or a proxy URL and
//! checks them once, in [`build`](ProxyConfigBuilder::build). Settings that
//! are accepted but have no effect become [`ConfigWarning`]s: they are logged
//! at build time and kept on the config so callers can surface them.

use std::sync::Arc;

use crate::dns::AddressFamily;
use crate::error::{self, Result};

use super::proxy::{Credentials, ProxyEndpoint, ProxyHop, ProxyType};

/// Longest username or password the SOCKS5 sub-negotiation can carry.
const MAX_SOCKS5_CREDENTIAL_LEN: usize = 255;

/// A setting that was accepted but is ignored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigWarning {
    #[error("the address family hint is deprecated and ignored; addresses are chosen IPv4 first")]
    FamilyIgnored(AddressFamily),
    #[error("SOCKS4 has no password field; the password is ignored")]
    Socks4IgnoresPassword,
    #[error("HTTP CONNECT always sends the destination name to the proxy; rdns is ignored")]
    HttpIgnoresRdns,
    #[error("a password was given without a username and is ignored")]
    PasswordWithoutUsername,
}

/// A proxy endpoint with its protocol, ready to hand to a connector.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    proxy_type: ProxyType,
    endpoint: Arc<ProxyEndpoint>,
    warnings: Vec<ConfigWarning>,
}

impl ProxyConfig {
    /// Starts a configuration for the given protocol.
    #[must_use]
    pub fn builder(proxy_type: ProxyType) -> ProxyConfigBuilder {
        ProxyConfigBuilder::new(proxy_type)
    }

    /// Parses and validates `scheme://[user[:pass]@]host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for malformed URLs,
    /// unknown schemes, a missing port, or settings rejected by
    /// [`ProxyConfigBuilder::build`].
    pub fn from_url(url: &str) -> Result<Self> {
        ProxyConfigBuilder::from_url(url)?.build()
    }

    #[must_use]
    pub fn proxy_type(&self) -> ProxyType {
        self.proxy_type
    }

    #[must_use]
    pub fn endpoint(&self) -> &Arc<ProxyEndpoint> {
        &self.endpoint
    }

    /// Settings that were accepted but have no effect.
    #[must_use]
    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    /// This proxy as one hop of a route.
    #[must_use]
    pub fn hop(&self) -> ProxyHop {
        ProxyHop::new(self.proxy_type, Arc::clone(&self.endpoint))
    }
}

/// Builder for [`ProxyConfig`].
#[derive(Debug, Clone)]
#[must_use = "builders do nothing until `build` is called"]
pub struct ProxyConfigBuilder {
    proxy_type: ProxyType,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    rdns: Option<bool>,
    family: Option<AddressFamily>,
}

impl ProxyConfigBuilder {
    pub fn new(proxy_type: ProxyType) -> Self {
        Self {
            proxy_type,
            host: None,
            port: None,
            username: None,
            password: None,
            rdns: None,
            family: None,
        }
    }

    pub fn proxy_type(mut self, proxy_type: ProxyType) -> Self {
        self.proxy_type = proxy_type;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets username and password together.
    pub fn credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username(username).password(password)
    }

    /// Resolve destination names at the proxy (`true`) or locally (`false`).
    pub fn rdns(mut self, rdns: bool) -> Self {
        self.rdns = Some(rdns);
        self
    }

    /// Address family hint. Has no effect; recorded as a warning.
    #[deprecated(note = "addresses are always selected IPv4 first; this hint is ignored")]
    pub fn family(mut self, family: AddressFamily) -> Self {
        self.family = Some(family);
        self
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for an empty host, a
    /// missing or zero port, SOCKS5 credentials longer than 255 bytes, a NUL
    /// in a SOCKS4 user-id, or a colon in an HTTP username.
    pub fn build(self) -> Result<ProxyConfig> {
        let host = self
            .host
            .filter(|host| !host.is_empty())
            .ok_or_else(|| error::config("Proxy host must not be empty"))?;
        let port = match self.port {
            Some(port) if port != 0 => port,
            Some(_) => return Err(error::config("Proxy port must not be 0")),
            None => return Err(error::config(format!("Proxy {host} has no port"))),
        };

        let mut warnings = Vec::new();
        if let Some(family) = self.family {
            warnings.push(ConfigWarning::FamilyIgnored(family));
        }

        let username = self.username.filter(|name| !name.is_empty());
        let password = self.password.filter(|pass| !pass.is_empty());
        let credentials = match (username, password) {
            (Some(username), password) => {
                validate_credentials(self.proxy_type, &username, password.as_deref())?;
                if self.proxy_type == ProxyType::Socks4 && password.is_some() {
                    warnings.push(ConfigWarning::Socks4IgnoresPassword);
                }
                Some(Credentials::new(username, password))
            }
            (None, Some(_)) => {
                warnings.push(ConfigWarning::PasswordWithoutUsername);
                None
            }
            (None, None) => None,
        };

        if self.proxy_type == ProxyType::Http && self.rdns.is_some() {
            warnings.push(ConfigWarning::HttpIgnoresRdns);
        }

        let mut endpoint = ProxyEndpoint::new(host, port);
        if let Some(credentials) = credentials {
            endpoint = endpoint.with_credentials(credentials);
        }
        if let Some(rdns) = self.rdns {
            endpoint = endpoint.with_rdns(rdns);
        }

        for warning in &warnings {
            tracing::warn!(
                target: "sockhop::config",
                proxy = %endpoint,
                proxy.kind = %self.proxy_type,
                "{warning}"
            );
        }

        Ok(ProxyConfig {
            proxy_type: self.proxy_type,
            endpoint: Arc::new(endpoint),
            warnings,
        })
    }
}

fn validate_credentials(proxy_type: ProxyType, username: &str, password: Option<&str>) -> Result<()> {
    match proxy_type {
        ProxyType::Socks5 => {
            if username.len() > MAX_SOCKS5_CREDENTIAL_LEN {
                return Err(error::config("SOCKS5 username must be at most 255 bytes"));
            }
            if password.is_some_and(|p| p.len() > MAX_SOCKS5_CREDENTIAL_LEN) {
                return Err(error::config("SOCKS5 password must be at most 255 bytes"));
            }
        }
        ProxyType::Socks4 => {
            if username.contains('\0') {
                return Err(error::config("SOCKS4 user-id must not contain NUL bytes"));
            }
        }
        ProxyType::Http => {
            if username.contains(':') {
                return Err(error::config("HTTP proxy username must not contain ':'"));
            }
        }
    }
    Ok(())
}
