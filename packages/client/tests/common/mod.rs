//! Loopback mock proxies and an echo destination for connector tests.
//!
//! Every server binds `127.0.0.1:0` and runs on the tokio runtime it was
//! spawned from. Blocking tests host them on a background runtime.

#![allow(dead_code)]

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockProtocol {
    Socks4,
    Socks5,
    Http,
}

/// How the mock answers a request.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Grant and relay to the upstream address.
    Grant,
    /// Refuse with this SOCKS reply code.
    SocksCode(u8),
    /// Refuse with this HTTP status line.
    HttpStatus(&'static str),
    /// Accept the TCP connection and never answer.
    Stall,
}

/// What the mock saw from the client.
#[derive(Debug, Clone, Default)]
pub struct CapturedRequest {
    /// SOCKS5 offered authentication methods.
    pub methods: Vec<u8>,
    /// SOCKS5 username/password, or the SOCKS4 user-id with an empty password.
    pub credentials: Option<(String, String)>,
    /// HTTP `Proxy-Authorization` value.
    pub authorization: Option<String>,
    /// Requested destination as `host:port`.
    pub target: String,
    /// Raw request bytes (SOCKS request packet or HTTP head).
    pub raw: Vec<u8>,
}

pub struct MockProxy {
    pub addr: SocketAddr,
    requests: mpsc::UnboundedReceiver<CapturedRequest>,
    closed: mpsc::UnboundedReceiver<()>,
}

#[derive(Clone)]
struct MockSettings {
    protocol: MockProtocol,
    reply: MockReply,
    upstream: Option<SocketAddr>,
    required_credentials: Option<(String, String)>,
    requests: mpsc::UnboundedSender<CapturedRequest>,
    closed: mpsc::UnboundedSender<()>,
}

impl MockProxy {
    pub async fn spawn(protocol: MockProtocol, reply: MockReply, upstream: Option<SocketAddr>) -> Self {
        Self::spawn_with_auth(protocol, reply, upstream, None).await
    }

    pub async fn spawn_with_auth(
        protocol: MockProtocol,
        reply: MockReply,
        upstream: Option<SocketAddr>,
        required_credentials: Option<(&str, &str)>,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("mock proxy should bind");
        let addr = listener.local_addr().expect("mock proxy address");
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let (closed_tx, closed) = mpsc::unbounded_channel();
        let settings = MockSettings {
            protocol,
            reply,
            upstream,
            required_credentials: required_credentials.map(|(u, p)| (u.to_owned(), p.to_owned())),
            requests: requests_tx,
            closed: closed_tx,
        };

        tokio::spawn(async move {
            while let Ok((client, _)) = listener.accept().await {
                let settings = settings.clone();
                tokio::spawn(async move {
                    let _ = serve(client, settings).await;
                });
            }
        });

        Self {
            addr,
            requests,
            closed,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// The next request the mock received.
    pub async fn next_request(&mut self) -> CapturedRequest {
        tokio::time::timeout(WAIT, self.requests.recv())
            .await
            .expect("mock proxy should receive a request in time")
            .expect("mock proxy channel open")
    }

    /// Resolves once a stalled client connection has been closed by the client.
    pub async fn wait_closed(&mut self) {
        tokio::time::timeout(WAIT, self.closed.recv())
            .await
            .expect("client should close the stalled connection")
            .expect("mock proxy channel open");
    }
}

async fn serve(mut client: TcpStream, settings: MockSettings) -> io::Result<()> {
    if matches!(settings.reply, MockReply::Stall) {
        let mut sink = [0u8; 512];
        loop {
            match client.read(&mut sink).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
        let _ = settings.closed.send(());
        return Ok(());
    }

    match settings.protocol {
        MockProtocol::Socks4 => serve_socks4(client, settings).await,
        MockProtocol::Socks5 => {
            if serve_socks5(&mut client, &settings).await? {
                relay(client, settings.upstream).await
            } else {
                Ok(())
            }
        }
        MockProtocol::Http => serve_http(client, settings).await,
    }
}

async fn relay(mut client: TcpStream, upstream: Option<SocketAddr>) -> io::Result<()> {
    let upstream = upstream.ok_or_else(|| io::Error::other("mock has no upstream"))?;
    let mut server = TcpStream::connect(upstream).await?;
    tokio::io::copy_bidirectional(&mut client, &mut server).await?;
    Ok(())
}

async fn read_until_nul(client: &mut TcpStream, raw: &mut Vec<u8>) -> io::Result<String> {
    let mut field = Vec::new();
    loop {
        let byte = client.read_u8().await?;
        raw.push(byte);
        if byte == 0 {
            break;
        }
        field.push(byte);
    }
    Ok(String::from_utf8_lossy(&field).into_owned())
}

async fn serve_socks4(mut client: TcpStream, settings: MockSettings) -> io::Result<()> {
    let mut header = [0u8; 8];
    client.read_exact(&mut header).await?;
    let mut raw = header.to_vec();
    let port = u16::from_be_bytes([header[2], header[3]]);
    let ip = Ipv4Addr::new(header[4], header[5], header[6], header[7]);
    let user_id = read_until_nul(&mut client, &mut raw).await?;
    let host = if header[4..7] == [0, 0, 0] && header[7] != 0 {
        read_until_nul(&mut client, &mut raw).await?
    } else {
        ip.to_string()
    };

    let _ = settings.requests.send(CapturedRequest {
        credentials: Some((user_id, String::new())),
        target: format!("{host}:{port}"),
        raw,
        ..CapturedRequest::default()
    });

    match settings.reply {
        MockReply::Grant => {
            client.write_all(&[0x00, 0x5A, 0, 0, 0, 0, 0, 0]).await?;
            relay(client, settings.upstream).await
        }
        MockReply::SocksCode(code) => {
            client.write_all(&[0x00, code, 0, 0, 0, 0, 0, 0]).await?;
            Ok(())
        }
        MockReply::HttpStatus(_) | MockReply::Stall => Ok(()),
    }
}

/// Returns `true` when the request was granted and the caller should relay.
async fn serve_socks5(client: &mut TcpStream, settings: &MockSettings) -> io::Result<bool> {
    let mut captured = CapturedRequest::default();

    let mut greeting = [0u8; 2];
    client.read_exact(&mut greeting).await?;
    let mut methods = vec![0u8; usize::from(greeting[1])];
    client.read_exact(&mut methods).await?;
    captured.methods.clone_from(&methods);

    if let Some((user, pass)) = &settings.required_credentials {
        if !methods.contains(&0x02) {
            client.write_all(&[0x05, 0xFF]).await?;
            let _ = settings.requests.send(captured);
            return Ok(false);
        }
        client.write_all(&[0x05, 0x02]).await?;
        let _version = client.read_u8().await?;
        let mut name = vec![0u8; usize::from(client.read_u8().await?)];
        client.read_exact(&mut name).await?;
        let mut secret = vec![0u8; usize::from(client.read_u8().await?)];
        client.read_exact(&mut secret).await?;
        let name = String::from_utf8_lossy(&name).into_owned();
        let secret = String::from_utf8_lossy(&secret).into_owned();
        let accepted = &name == user && &secret == pass;
        client.write_all(&[0x01, if accepted { 0x00 } else { 0x01 }]).await?;
        captured.credentials = Some((name, secret));
        if !accepted {
            let _ = settings.requests.send(captured);
            return Ok(false);
        }
    } else {
        client.write_all(&[0x05, 0x00]).await?;
    }

    let mut header = [0u8; 4];
    client.read_exact(&mut header).await?;
    captured.raw.extend_from_slice(&header);
    let host = match header[3] {
        0x01 => {
            let mut octets = [0u8; 4];
            client.read_exact(&mut octets).await?;
            captured.raw.extend_from_slice(&octets);
            Ipv4Addr::from(octets).to_string()
        }
        0x03 => {
            let len = client.read_u8().await?;
            let mut name = vec![0u8; usize::from(len)];
            client.read_exact(&mut name).await?;
            captured.raw.push(len);
            captured.raw.extend_from_slice(&name);
            String::from_utf8_lossy(&name).into_owned()
        }
        _ => {
            let mut octets = [0u8; 16];
            client.read_exact(&mut octets).await?;
            captured.raw.extend_from_slice(&octets);
            format!("[{}]", Ipv6Addr::from(octets))
        }
    };
    let port = client.read_u16().await?;
    captured.raw.extend_from_slice(&port.to_be_bytes());
    captured.target = format!("{host}:{port}");
    let _ = settings.requests.send(captured);

    match settings.reply {
        MockReply::SocksCode(code) => {
            client.write_all(&[0x05, code, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await?;
            Ok(false)
        }
        MockReply::Grant => {
            // Whole reply in one segment so the client's short read ends the drain.
            client
                .write_all(&[0x05, 0x00, 0x00, 0x01, 127, 0, 0, 1, 0x1F, 0x90])
                .await?;
            Ok(true)
        }
        MockReply::HttpStatus(_) | MockReply::Stall => Ok(false),
    }
}

async fn serve_http(mut client: TcpStream, settings: MockSettings) -> io::Result<()> {
    let mut head = Vec::new();
    while !head.ends_with(b"\r\n\r\n") {
        head.push(client.read_u8().await?);
    }
    let text = String::from_utf8_lossy(&head).into_owned();
    let target = text
        .lines()
        .next()
        .and_then(|line| line.split(' ').nth(1))
        .unwrap_or_default()
        .to_owned();
    let authorization = text
        .lines()
        .find_map(|line| line.strip_prefix("Proxy-Authorization: "))
        .map(str::to_owned);

    let _ = settings.requests.send(CapturedRequest {
        authorization,
        target,
        raw: head,
        ..CapturedRequest::default()
    });

    match settings.reply {
        MockReply::Grant => {
            client
                .write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
                .await?;
            relay(client, settings.upstream).await
        }
        MockReply::HttpStatus(status) => {
            let response = format!("{status}\r\nContent-Length: 0\r\n\r\n");
            client.write_all(response.as_bytes()).await?;
            Ok(())
        }
        MockReply::SocksCode(_) | MockReply::Stall => Ok(()),
    }
}

/// Echo server: every byte received is sent back.
pub async fn spawn_echo() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("echo server should bind");
    let addr = listener.local_addr().expect("echo address");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = socket.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });
    addr
}

/// Destination that answers any connection with a TLS record header sent
/// one byte every `interval`, never completing a handshake.
pub async fn spawn_trickle(interval: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("trickle server should bind");
    let addr = listener.local_addr().expect("trickle address");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                for byte in [0x16, 0x03, 0x03, 0x40, 0x00].into_iter().cycle().take(64) {
                    tokio::time::sleep(interval).await;
                    if socket.write_all(&[byte]).await.is_err() {
                        return;
                    }
                }
            });
        }
    });
    addr
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("placeholder listener should bind");
    listener.local_addr().expect("placeholder address")
}

/// Deterministic payload for round-trip checks.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Background runtime hosting mock servers for blocking tests.
pub fn server_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("server runtime should start")
}
