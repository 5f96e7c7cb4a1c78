//! Literal-address detection for hosts.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// What a host string denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// Anything that is not an IP literal.
    Domain,
}

impl HostKind {
    #[must_use]
    pub fn is_domain(&self) -> bool {
        matches!(self, HostKind::Domain)
    }

    /// The literal address, if the host was one.
    #[must_use]
    pub fn ip(&self) -> Option<IpAddr> {
        match *self {
            HostKind::Ipv4(ip) => Some(IpAddr::V4(ip)),
            HostKind::Ipv6(ip) => Some(IpAddr::V6(ip)),
            HostKind::Domain => None,
        }
    }
}

/// Removes the brackets around an IPv6 literal such as `[::1]`.
#[must_use]
pub fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(host)
}

/// Classifies a host as an IPv4 literal, an IPv6 literal, or a domain name.
///
/// Never performs I/O.
#[must_use]
pub fn classify(host: &str) -> HostKind {
    match strip_brackets(host).parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => HostKind::Ipv4(ip),
        Ok(IpAddr::V6(ip)) => HostKind::Ipv6(ip),
        Err(_) => HostKind::Domain,
    }
}
