//! SOCKS5 (RFC 1928) with username/password authentication (RFC 1929).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::config::{DestinationTarget, ProxyEndpoint, ProxyType};
use crate::config::connect::{DEFAULT_READ_BUFFER_SIZE, MIN_READ_BUFFER_SIZE};
use crate::connect::transport::ByteStream;
use crate::dns::{HostKind, Resolve, classify};
use crate::error::{self, Result};

use super::ascii_domain;

const SOCKS5_VERSION: u8 = 0x05;
const AUTH_NONE: u8 = 0x00;
const AUTH_USERNAME_PASSWORD: u8 = 0x02;
const AUTH_NO_ACCEPTABLE: u8 = 0xFF;
const AUTH_SUBNEGOTIATION_VERSION: u8 = 0x01;
const CMD_CONNECT: u8 = 0x01;
const RESERVED: u8 = 0x00;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;
const MAX_FIELD_LEN: usize = 255;

/// Destination as it is encoded in a SOCKS5 request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddress {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// ASCII (IDNA) hostname resolved by the proxy.
    Domain(String),
}

impl From<IpAddr> for TargetAddress {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(ip) => TargetAddress::Ipv4(ip),
            IpAddr::V6(ip) => TargetAddress::Ipv6(ip),
        }
    }
}

/// SOCKS5 negotiator.
#[derive(Clone, PartialEq, Eq)]
pub struct Socks5Negotiator {
    credentials: Option<(String, String)>,
    rdns: bool,
    read_buffer_size: usize,
}

impl std::fmt::Debug for Socks5Negotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socks5Negotiator")
            .field("username", &self.credentials.as_ref().map(|(user, _)| user))
            .field("rdns", &self.rdns)
            .field("read_buffer_size", &self.read_buffer_size)
            .finish()
    }
}

impl Socks5Negotiator {
    /// `credentials` are offered only when both parts are non-empty.
    #[must_use]
    pub fn new(credentials: Option<(String, String)>, rdns: bool) -> Self {
        Self {
            credentials: credentials.filter(|(user, pass)| !user.is_empty() && !pass.is_empty()),
            rdns,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    #[must_use]
    pub fn from_endpoint(endpoint: &ProxyEndpoint) -> Self {
        let credentials = endpoint
            .credentials()
            .and_then(|creds| creds.pair())
            .map(|(user, pass)| (user.to_owned(), pass.to_owned()));
        let rdns = endpoint
            .rdns()
            .unwrap_or_else(|| ProxyType::Socks5.default_rdns());
        Self::new(credentials, rdns)
    }

    /// Chunk size used to drain the bound address after the reply header.
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(MIN_READ_BUFFER_SIZE);
        self
    }

    /// Method selection, then username/password sub-negotiation if the proxy picks it.
    ///
    /// # Errors
    ///
    /// `Proxy` for a wrong version, no acceptable method, a method that was
    /// not offered, or rejected credentials. `Config` for credentials longer
    /// than 255 bytes.
    pub async fn authenticate<S: ByteStream>(&self, stream: &mut S) -> Result<()> {
        let greeting = encode_greeting(self.credentials.is_some());
        tracing::debug!(
            target: "sockhop::socks5",
            methods = ?&greeting[2..],
            "offering SOCKS5 authentication methods"
        );
        stream.write_all(&greeting).await?;

        let reply = stream.read_exact(2).await?;
        if reply[0] != SOCKS5_VERSION {
            return Err(unexpected_version(reply[0]));
        }
        match (reply[1], &self.credentials) {
            (AUTH_NONE, _) => Ok(()),
            (AUTH_USERNAME_PASSWORD, Some((username, password))) => {
                self.login(stream, username, password).await
            }
            (AUTH_NO_ACCEPTABLE, _) => Err(error::proxy(
                "No acceptable authentication methods were offered",
            )),
            (method, _) => Err(error::proxy(format!(
                "Unexpected SOCKS authentication method: {method}"
            ))),
        }
    }

    async fn login<S: ByteStream>(&self, stream: &mut S, username: &str, password: &str) -> Result<()> {
        stream.write_all(&encode_credentials(username, password)?).await?;
        let reply = stream.read_exact(2).await?;
        if reply[0] != AUTH_SUBNEGOTIATION_VERSION {
            return Err(error::proxy("Invalid authentication response"));
        }
        if reply[1] != 0x00 {
            return Err(error::proxy_with_code(
                "Username and password authentication failure",
                u16::from(reply[1]),
            ));
        }
        tracing::debug!(target: "sockhop::socks5", "SOCKS5 credentials accepted");
        Ok(())
    }

    /// Sends CONNECT and validates the reply.
    ///
    /// # Errors
    ///
    /// `Proxy` with the reply code for refusals, `Config` for names that
    /// cannot be encoded, `Resolve` when local resolution fails.
    pub async fn request<S: ByteStream, R: Resolve>(
        &self,
        stream: &mut S,
        resolver: &R,
        target: &DestinationTarget,
    ) -> Result<()> {
        let address = self.target_address(resolver, target).await?;
        let packet = encode_connect(&address, target.port())?;
        tracing::debug!(
            target: "sockhop::socks5",
            destination = %target,
            remote_dns = self.rdns,
            "sending SOCKS5 connect request"
        );
        stream.write_all(&packet).await?;

        let header = stream.read_exact(3).await?;
        if header[0] != SOCKS5_VERSION {
            return Err(unexpected_version(header[0]));
        }
        if header[1] != 0x00 {
            return Err(error::proxy_with_code(
                reply_message(header[1]),
                u16::from(header[1]),
            ));
        }
        if header[2] != RESERVED {
            return Err(error::proxy("The reserved byte must be 0x00"));
        }
        // Bound address and port; not used.
        stream.read_to_eof(self.read_buffer_size).await?;
        Ok(())
    }

    async fn target_address<R: Resolve>(
        &self,
        resolver: &R,
        target: &DestinationTarget,
    ) -> Result<TargetAddress> {
        Ok(match classify(target.host()) {
            HostKind::Ipv4(ip) => TargetAddress::Ipv4(ip),
            HostKind::Ipv6(ip) => TargetAddress::Ipv6(ip),
            HostKind::Domain if self.rdns => TargetAddress::Domain(ascii_domain(target.host())?),
            HostKind::Domain => resolver.resolve(target.host()).await?.ip().into(),
        })
    }
}

fn unexpected_version(version: u8) -> error::Error {
    error::proxy(format!("Unexpected SOCKS version number: {version}"))
}

/// `VER NMETHODS METHODS`.
#[must_use]
pub fn encode_greeting(with_credentials: bool) -> Vec<u8> {
    if with_credentials {
        vec![SOCKS5_VERSION, 0x02, AUTH_USERNAME_PASSWORD, AUTH_NONE]
    } else {
        vec![SOCKS5_VERSION, 0x01, AUTH_NONE]
    }
}

/// `VER ULEN UNAME PLEN PASSWD`.
///
/// # Errors
///
/// `Config` when either field exceeds 255 bytes.
pub fn encode_credentials(username: &str, password: &str) -> Result<Vec<u8>> {
    let user = u8::try_from(username.len())
        .map_err(|_| error::config("SOCKS5 username must be at most 255 bytes"))?;
    let pass = u8::try_from(password.len())
        .map_err(|_| error::config("SOCKS5 password must be at most 255 bytes"))?;

    let mut packet = Vec::with_capacity(3 + username.len() + password.len());
    packet.push(AUTH_SUBNEGOTIATION_VERSION);
    packet.push(user);
    packet.extend_from_slice(username.as_bytes());
    packet.push(pass);
    packet.extend_from_slice(password.as_bytes());
    Ok(packet)
}

/// `VER CMD RSV ATYP DST.ADDR DST.PORT`.
///
/// # Errors
///
/// `Config` when a domain is longer than 255 bytes.
pub fn encode_connect(address: &TargetAddress, port: u16) -> Result<Vec<u8>> {
    let mut packet = vec![SOCKS5_VERSION, CMD_CONNECT, RESERVED];
    match address {
        TargetAddress::Ipv4(ip) => {
            packet.push(ATYP_IPV4);
            packet.extend_from_slice(&ip.octets());
        }
        TargetAddress::Ipv6(ip) => {
            packet.push(ATYP_IPV6);
            packet.extend_from_slice(&ip.octets());
        }
        TargetAddress::Domain(domain) => {
            if domain.len() > MAX_FIELD_LEN {
                return Err(error::config(format!(
                    "SOCKS5 destination name is longer than {MAX_FIELD_LEN} bytes"
                )));
            }
            packet.push(ATYP_DOMAIN);
            packet.push(domain.len() as u8);
            packet.extend_from_slice(domain.as_bytes());
        }
    }
    packet.extend_from_slice(&port.to_be_bytes());
    Ok(packet)
}

/// Text for a SOCKS5 reply code.
#[must_use]
pub fn reply_message(code: u8) -> &'static str {
    match code {
        0x00 => "Succeeded",
        0x01 => "General SOCKS server failure",
        0x02 => "Connection not allowed by ruleset",
        0x03 => "Network unreachable",
        0x04 => "Host unreachable",
        0x05 => "Connection refused",
        0x06 => "TTL expired",
        0x07 => "Command not supported, or protocol error",
        0x08 => "Address type not supported",
        _ => "Unknown error",
    }
}
