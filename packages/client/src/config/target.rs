//! Destination addresses.

use std::fmt;

use crate::dns::strip_brackets;
use crate::error::{self, Error};

/// The host and port the tunnel must reach.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationTarget {
    host: String,
    port: u16,
}

impl DestinationTarget {
    /// Creates a target. Brackets around IPv6 literals are removed.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            host: strip_brackets(&host).to_owned(),
            port,
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for DestinationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Whether the destination leg is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] for anything but `http` and `https`.
    pub fn parse(scheme: &str) -> Result<Self, Error> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            _ => Err(error::config(format!("Unsupported destination scheme: {scheme}"))),
        }
    }
}

/// Scheme plus destination: what an HTTP engine asks the connector for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: Scheme,
    target: DestinationTarget,
}

impl Origin {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            scheme,
            target: DestinationTarget::new(host, port.unwrap_or(scheme.default_port())),
        }
    }

    /// Derives the origin of an absolute `http://` or `https://` URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL does not parse, has another
    /// scheme, or has no host.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let url = url::Url::parse(url)
            .map_err(|e| error::config(format!("Invalid destination URL: {e}")))?;
        let scheme = Scheme::parse(url.scheme())?;
        let host = url
            .host_str()
            .ok_or_else(|| error::config("Destination URL has no host"))?;
        Ok(Self::new(scheme, host, url.port()))
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn target(&self) -> &DestinationTarget {
        &self.target
    }

    #[must_use]
    pub fn requires_tls(&self) -> bool {
        self.scheme == Scheme::Https
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        write!(f, "{scheme}://{}", self.target)
    }
}
