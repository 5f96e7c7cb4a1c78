//! HTTP CONNECT tunnelling.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::config::connect::DEFAULT_MAX_RESPONSE_HEADER_BYTES;
use crate::config::{DestinationTarget, ProxyEndpoint};
use crate::connect::transport::ByteStream;
use crate::dns::{HostKind, classify};
use crate::error::{self, Result};

use super::ascii_domain;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const MAX_RESPONSE_HEADERS: usize = 64;

/// HTTP CONNECT negotiator.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpConnectNegotiator {
    authorization: Option<String>,
    max_header_bytes: usize,
}

impl fmt::Debug for HttpConnectNegotiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnectNegotiator")
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .field("max_header_bytes", &self.max_header_bytes)
            .finish()
    }
}

impl HttpConnectNegotiator {
    /// `credentials` become a `Proxy-Authorization: Basic` header. A missing
    /// password is encoded as empty.
    #[must_use]
    pub fn new(credentials: Option<(&str, Option<&str>)>) -> Self {
        let authorization = credentials.map(|(username, password)| {
            let token = STANDARD.encode(format!("{username}:{}", password.unwrap_or_default()));
            format!("Basic {token}")
        });
        Self {
            authorization,
            max_header_bytes: DEFAULT_MAX_RESPONSE_HEADER_BYTES,
        }
    }

    #[must_use]
    pub fn from_endpoint(endpoint: &ProxyEndpoint) -> Self {
        Self::new(
            endpoint
                .credentials()
                .map(|creds| (creds.username(), creds.password())),
        )
    }

    /// Largest response head accepted before giving up.
    #[must_use]
    pub fn with_max_header_bytes(mut self, limit: usize) -> Self {
        self.max_header_bytes = limit;
        self
    }

    /// Sends the CONNECT request and reads the response head.
    ///
    /// Reads stop exactly at the blank line ending the head, so bytes the
    /// destination sends right after are left on the stream.
    ///
    /// # Errors
    ///
    /// `Proxy` carrying the status line and code for non-2xx answers, or for
    /// malformed and oversized heads.
    pub async fn request<S: ByteStream>(&self, stream: &mut S, target: &DestinationTarget) -> Result<()> {
        let request = self.encode_request(target)?;
        tracing::debug!(
            target: "sockhop::http_connect",
            destination = %target,
            authenticated = self.authorization.is_some(),
            "sending CONNECT request"
        );
        stream.write_all(request.as_bytes()).await?;

        let head = self.read_head(stream).await?;
        let (code, status_line) = parse_status(&head)?;
        if (200..300).contains(&code) {
            tracing::debug!(target: "sockhop::http_connect", status = code, "tunnel accepted");
            Ok(())
        } else {
            Err(error::proxy_with_code(status_line, code))
        }
    }

    /// `CONNECT host:port HTTP/1.1` with `Host` and optional `Proxy-Authorization`.
    ///
    /// # Errors
    ///
    /// `Config` when the host cannot appear in a request line.
    pub fn encode_request(&self, target: &DestinationTarget) -> Result<String> {
        let authority = match classify(target.host()) {
            HostKind::Ipv6(ip) => format!("[{ip}]:{}", target.port()),
            HostKind::Ipv4(ip) => format!("{ip}:{}", target.port()),
            HostKind::Domain => format!("{}:{}", ascii_domain(target.host())?, target.port()),
        };

        let mut request = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n");
        if let Some(authorization) = &self.authorization {
            request.push_str("Proxy-Authorization: ");
            request.push_str(authorization);
            request.push_str("\r\n");
        }
        request.push_str("\r\n");
        Ok(request)
    }

    async fn read_head<S: ByteStream>(&self, stream: &mut S) -> Result<Vec<u8>> {
        let mut head = Vec::with_capacity(256);
        while !head.ends_with(HEADER_TERMINATOR) {
            if head.len() >= self.max_header_bytes {
                return Err(error::proxy(format!(
                    "Proxy response headers too large (limit {} bytes)",
                    self.max_header_bytes
                )));
            }
            let byte = stream.read_exact(1).await?;
            head.extend_from_slice(&byte);
        }
        Ok(head)
    }
}

/// Status code and status line of a complete response head.
fn parse_status(head: &[u8]) -> Result<(u16, String)> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_RESPONSE_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    match response.parse(head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(error::proxy("Invalid proxy response: incomplete header"));
        }
        Err(e) => return Err(error::proxy(format!("Invalid proxy response: {e}"))),
    }
    let code = response
        .code
        .ok_or_else(|| error::proxy("Invalid proxy response: missing status code"))?;

    let line_end = head
        .windows(2)
        .position(|pair| pair == b"\r\n")
        .unwrap_or(head.len());
    let status_line = String::from_utf8_lossy(&head[..line_end]).into_owned();
    Ok((code, status_line))
}
