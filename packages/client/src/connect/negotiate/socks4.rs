//! SOCKS4 and SOCKS4a.

use std::net::{IpAddr, Ipv4Addr};

use crate::config::{DestinationTarget, ProxyEndpoint, ProxyType};
use crate::connect::transport::ByteStream;
use crate::dns::{HostKind, Resolve, classify};
use crate::error::{self, Result};

use super::ascii_domain;

const SOCKS4_VERSION: u8 = 0x04;
const CMD_CONNECT: u8 = 0x01;
const REPLY_VERSION: u8 = 0x00;
const REPLY_GRANTED: u8 = 0x5A;
const REPLY_LEN: usize = 8;

/// `0.0.0.1`: tells a SOCKS4a server that a hostname follows the user-id.
const SOCKS4A_MARKER: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 1);

/// SOCKS4 negotiator. With `rdns` the destination name is sent to the proxy
/// (SOCKS4a); otherwise it is resolved locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Socks4Negotiator {
    user_id: String,
    rdns: bool,
}

impl Socks4Negotiator {
    pub fn new(user_id: impl Into<String>, rdns: bool) -> Self {
        Self {
            user_id: user_id.into(),
            rdns,
        }
    }

    /// Uses the endpoint's username as user-id. Passwords are not part of SOCKS4.
    #[must_use]
    pub fn from_endpoint(endpoint: &ProxyEndpoint) -> Self {
        let user_id = endpoint
            .credentials()
            .map(|creds| creds.username().to_owned())
            .unwrap_or_default();
        let rdns = endpoint
            .rdns()
            .unwrap_or_else(|| ProxyType::Socks4.default_rdns());
        Self::new(user_id, rdns)
    }

    /// Sends the CONNECT request and checks the 8-byte reply.
    ///
    /// # Errors
    ///
    /// `Config` for IPv6 destinations or a user-id containing NUL, `Proxy`
    /// for any reply other than "request granted".
    pub async fn request<S: ByteStream, R: Resolve>(
        &self,
        stream: &mut S,
        resolver: &R,
        target: &DestinationTarget,
    ) -> Result<()> {
        let packet = self.build_request(resolver, target).await?;
        tracing::debug!(
            target: "sockhop::socks4",
            destination = %target,
            remote_dns = self.rdns,
            "sending SOCKS4 connect request"
        );
        stream.write_all(&packet).await?;

        let reply = stream.read_exact(REPLY_LEN).await?;
        check_reply(&reply)
    }

    async fn build_request<R: Resolve>(
        &self,
        resolver: &R,
        target: &DestinationTarget,
    ) -> Result<Vec<u8>> {
        if self.user_id.contains('\0') {
            return Err(error::config("SOCKS4 user-id must not contain NUL bytes"));
        }

        let packet = match classify(target.host()) {
            HostKind::Ipv4(ip) => encode_request(target.port(), ip, &self.user_id, None),
            HostKind::Ipv6(_) => {
                return Err(error::config(format!(
                    "SOCKS4 does not support IPv6 destination {target}"
                )));
            }
            HostKind::Domain if self.rdns => {
                let domain = ascii_domain(target.host())?;
                encode_request(target.port(), SOCKS4A_MARKER, &self.user_id, Some(&domain))
            }
            HostKind::Domain => match resolver.resolve(target.host()).await?.ip() {
                IpAddr::V4(ip) => encode_request(target.port(), ip, &self.user_id, None),
                IpAddr::V6(_) => {
                    return Err(error::config(format!(
                        "SOCKS4 does not support IPv6: {} resolves only to IPv6",
                        target.host()
                    )));
                }
            },
        };
        Ok(packet)
    }
}

/// `VER CMD DSTPORT DSTIP USERID NUL [HOST NUL]`.
#[must_use]
pub fn encode_request(port: u16, address: Ipv4Addr, user_id: &str, domain: Option<&str>) -> Vec<u8> {
    let mut packet = Vec::with_capacity(10 + user_id.len() + domain.map_or(0, |d| d.len() + 1));
    packet.push(SOCKS4_VERSION);
    packet.push(CMD_CONNECT);
    packet.extend_from_slice(&port.to_be_bytes());
    packet.extend_from_slice(&address.octets());
    packet.extend_from_slice(user_id.as_bytes());
    packet.push(0x00);
    if let Some(domain) = domain {
        packet.extend_from_slice(domain.as_bytes());
        packet.push(0x00);
    }
    packet
}

fn check_reply(reply: &[u8]) -> Result<()> {
    if reply[0] != REPLY_VERSION {
        return Err(error::proxy(format!(
            "Unexpected SOCKS version number: {}",
            reply[0]
        )));
    }
    match reply[1] {
        REPLY_GRANTED => Ok(()),
        code => Err(error::proxy_with_code(reply_message(code), u16::from(code))),
    }
}

/// Text for a SOCKS4 reply code.
#[must_use]
pub fn reply_message(code: u8) -> &'static str {
    match code {
        0x5A => "Request granted",
        0x5B => "Request rejected or failed",
        0x5C => "Request rejected because SOCKS server cannot connect to identd on the client",
        0x5D => "Request rejected because the client program and identd report different user-ids",
        _ => "Unknown error",
    }
}
