//! Proxy type and endpoint.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::dns::strip_brackets;
use crate::error::{self, Error};

use super::target::DestinationTarget;

/// Proxy protocol spoken to an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyType {
    Http,
    Socks4,
    Socks5,
}

impl ProxyType {
    /// Parses a proxy URL scheme.
    ///
    /// Returns the proxy type and whether the scheme forces remote DNS
    /// (`socks4a`, `socks5h`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unknown schemes.
    pub fn from_scheme(scheme: &str) -> Result<(ProxyType, bool), Error> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Ok((ProxyType::Http, false)),
            "socks4" => Ok((ProxyType::Socks4, false)),
            "socks4a" => Ok((ProxyType::Socks4, true)),
            "socks5" => Ok((ProxyType::Socks5, false)),
            "socks5h" => Ok((ProxyType::Socks5, true)),
            _ => Err(error::config(format!("Invalid proxy type: {scheme}"))),
        }
    }

    /// Whether the proxy resolves destination names when the endpoint leaves
    /// `rdns` unset.
    #[must_use]
    pub fn default_rdns(self) -> bool {
        match self {
            ProxyType::Http | ProxyType::Socks5 => true,
            ProxyType::Socks4 => false,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyType::Http => "http",
            ProxyType::Socks4 => "socks4",
            ProxyType::Socks5 => "socks5",
        }
    }
}

impl FromStr for ProxyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProxyType::from_scheme(s).map(|(proxy_type, _)| proxy_type)
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proxy credentials. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Username and password, when both are present and non-empty.
    #[must_use]
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self.password() {
            Some(password) if !self.username.is_empty() && !password.is_empty() => {
                Some((&self.username, password))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where a proxy listens and how to talk to it.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    host: String,
    port: u16,
    credentials: Option<Credentials>,
    rdns: Option<bool>,
}

impl ProxyEndpoint {
    /// Creates an endpoint without credentials. IPv6 brackets are removed.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            host: strip_brackets(&host).to_owned(),
            port,
            credentials: None,
            rdns: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Forces remote (`true`) or local (`false`) resolution of destination names.
    #[must_use]
    pub fn with_rdns(mut self, rdns: bool) -> Self {
        self.rdns = Some(rdns);
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The explicit rdns setting; `None` means the protocol default.
    #[must_use]
    pub fn rdns(&self) -> Option<bool> {
        self.rdns
    }

    /// This endpoint as the target of a previous hop's request.
    #[must_use]
    pub fn target(&self) -> DestinationTarget {
        DestinationTarget::new(self.host.clone(), self.port)
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("credentials", &self.credentials)
            .field("rdns", &self.rdns)
            .finish()
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// One proxy in a route.
#[derive(Debug, Clone)]
pub struct ProxyHop {
    pub proxy_type: ProxyType,
    pub endpoint: Arc<ProxyEndpoint>,
}

impl ProxyHop {
    pub fn new(proxy_type: ProxyType, endpoint: impl Into<Arc<ProxyEndpoint>>) -> Self {
        Self {
            proxy_type,
            endpoint: endpoint.into(),
        }
    }
}
