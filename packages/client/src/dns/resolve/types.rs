//! Resolution results and errors.

use std::error::Error as StdError;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// IP address family, ordered by preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    #[must_use]
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => f.write_str("IPv4"),
            AddressFamily::Ipv6 => f.write_str("IPv6"),
        }
    }
}

/// The single address a resolver settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedAddress {
    address: IpAddr,
}

impl ResolvedAddress {
    #[must_use]
    pub fn new(address: IpAddr) -> Self {
        Self { address }
    }

    #[must_use]
    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.address)
    }

    #[must_use]
    pub fn ip(&self) -> IpAddr {
        self.address
    }

    #[must_use]
    pub fn with_port(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.address, port)
    }
}

impl From<IpAddr> for ResolvedAddress {
    fn from(address: IpAddr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.address, f)
    }
}

/// DNS failures.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The lookup succeeded but returned no usable address.
    #[error("Can't resolve address {host}: no address records")]
    NoAddresses { host: String },

    /// The lookup itself failed.
    #[error("Can't resolve address {host}: {source}")]
    LookupFailed {
        host: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The hostname is not something a resolver can look up.
    #[error("Invalid hostname {0:?}")]
    InvalidHostname(String),
}

impl ResolveError {
    pub fn lookup_failed(
        host: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        ResolveError::LookupFailed {
            host: host.into(),
            source: source.into(),
        }
    }

    pub fn no_addresses(host: impl Into<String>) -> Self {
        ResolveError::NoAddresses { host: host.into() }
    }

    /// The hostname the failure is about.
    #[must_use]
    pub fn host(&self) -> &str {
        match self {
            ResolveError::NoAddresses { host }
            | ResolveError::LookupFailed { host, .. }
            | ResolveError::InvalidHostname(host) => host,
        }
    }
}
