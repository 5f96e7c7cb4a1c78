//! Address selection and hostname checks shared by every resolver.

use std::net::IpAddr;

use super::types::{AddressFamily, ResolveError, ResolvedAddress};

/// Longest hostname DNS can carry.
const MAX_HOSTNAME_LEN: usize = 253;

/// Stable sort by family: IPv4 first, IPv6 second, original order kept within a family.
pub fn sort_by_family(addrs: &mut [IpAddr]) {
    addrs.sort_by_key(AddressFamily::of);
}

/// Picks the address a connection should use from a lookup result.
///
/// # Errors
///
/// Returns [`ResolveError::NoAddresses`] when `candidates` is empty.
pub fn select_address(
    host: &str,
    candidates: impl IntoIterator<Item = IpAddr>,
) -> Result<ResolvedAddress, ResolveError> {
    let mut addrs: Vec<IpAddr> = candidates.into_iter().collect();
    sort_by_family(&mut addrs);
    addrs
        .first()
        .copied()
        .map(ResolvedAddress::new)
        .ok_or_else(|| ResolveError::no_addresses(host))
}

/// Rejects hostnames no resolver could look up.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidHostname`] for empty or over-long names and
/// names containing whitespace or control characters.
pub fn validate_hostname(host: &str) -> Result<(), ResolveError> {
    if host.is_empty()
        || host.len() > MAX_HOSTNAME_LEN
        || host.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ResolveError::InvalidHostname(host.to_owned()));
    }
    Ok(())
}
