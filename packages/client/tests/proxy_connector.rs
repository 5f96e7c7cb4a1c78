//! End-to-end tests for the tokio connector against loopback mock proxies.

mod common;

use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use common::{MockProtocol, MockProxy, MockReply, closed_port, payload, spawn_echo};
use sockhop_client::{
    ConnectConfig, Credentials, DestinationTarget, Dial, Origin, ProxyConnector, ProxyEndpoint,
    ProxyHop, ProxyType, Scheme, StaticResolver, connect_through_proxy,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn local(port: u16) -> ProxyEndpoint {
    ProxyEndpoint::new("127.0.0.1", port)
}

async fn assert_echo(stream: &mut TcpStream, len: usize) {
    let data = payload(len);
    let (mut reader, mut writer) = stream.split();
    let write = async {
        writer.write_all(&data).await.expect("write through tunnel");
    };
    let read = async {
        let mut echoed = vec![0u8; data.len()];
        reader
            .read_exact(&mut echoed)
            .await
            .expect("read through tunnel");
        echoed
    };
    let ((), echoed) = tokio::join!(write, read);
    assert_eq!(echoed, data, "tunnel must be byte-transparent");
}

/// Never finishes connecting.
struct PendingDialer;

impl Dial for PendingDialer {
    type Stream = TcpStream;

    async fn dial(&self, _addr: SocketAddr) -> io::Result<TcpStream> {
        std::future::pending::<io::Result<TcpStream>>().await
    }
}

#[tokio::test]
async fn test_socks5_tunnel_round_trip() {
    let echo = spawn_echo().await;
    let mut proxy = MockProxy::spawn(MockProtocol::Socks5, MockReply::Grant, Some(echo)).await;
    let resolver = StaticResolver::new();

    let connector =
        ProxyConnector::new(ProxyType::Socks5, local(proxy.port())).with_resolver(resolver.clone());
    let mut stream = connector
        .connect(&DestinationTarget::new("127.0.0.1", echo.port()))
        .await
        .expect("tunnel should open");

    let request = proxy.next_request().await;
    assert_eq!(request.methods, [0x00]);
    assert_eq!(request.target, format!("127.0.0.1:{}", echo.port()));
    assert_eq!(resolver.lookups(), 0, "literal proxy and destination skip DNS");

    assert_echo(&mut stream, 16 * 1024).await;
}

#[tokio::test]
async fn test_socks5_smallest_read_buffer_round_trip() {
    let echo = spawn_echo().await;
    let proxy = MockProxy::spawn(MockProtocol::Socks5, MockReply::Grant, Some(echo)).await;

    let config = ConnectConfig::default()
        .with_timeout(Duration::from_secs(2))
        .with_read_buffer_size(1);
    let mut stream = ProxyConnector::new(ProxyType::Socks5, local(proxy.port()))
        .with_config(config)
        .connect(&DestinationTarget::new("127.0.0.1", echo.port()))
        .await
        .expect("a 10-byte grant must not wait for destination bytes");
    assert_echo(&mut stream, 256).await;
}

#[tokio::test]
async fn test_socks5_remote_dns_sends_hostname() {
    let echo = spawn_echo().await;
    let mut proxy = MockProxy::spawn(MockProtocol::Socks5, MockReply::Grant, Some(echo)).await;
    let resolver = StaticResolver::new();

    let connector =
        ProxyConnector::new(ProxyType::Socks5, local(proxy.port())).with_resolver(resolver.clone());
    let mut stream = connector
        .connect(&DestinationTarget::new("echo.test", echo.port()))
        .await
        .expect("tunnel should open");

    assert_eq!(proxy.next_request().await.target, format!("echo.test:{}", echo.port()));
    assert_eq!(resolver.lookups(), 0, "SOCKS5 defaults to remote DNS");
    assert_echo(&mut stream, 512).await;
}

#[tokio::test]
async fn test_socks5_local_dns_resolves_once() {
    let echo = spawn_echo().await;
    let mut proxy = MockProxy::spawn(MockProtocol::Socks5, MockReply::Grant, Some(echo)).await;
    let resolver = StaticResolver::new().with_host("echo.test", ["127.0.0.1".parse().unwrap()]);

    let connector = ProxyConnector::new(ProxyType::Socks5, local(proxy.port()).with_rdns(false))
        .with_resolver(resolver.clone());
    let _stream = connector
        .connect(&DestinationTarget::new("echo.test", echo.port()))
        .await
        .expect("tunnel should open");

    assert_eq!(proxy.next_request().await.target, format!("127.0.0.1:{}", echo.port()));
    assert_eq!(resolver.lookups(), 1);
}

#[tokio::test]
async fn test_socks5_credentials_accepted() {
    let echo = spawn_echo().await;
    let mut proxy = MockProxy::spawn_with_auth(
        MockProtocol::Socks5,
        MockReply::Grant,
        Some(echo),
        Some(("alice", "s3cret")),
    )
    .await;

    let endpoint = local(proxy.port()).with_credentials(Credentials::new("alice", Some("s3cret".into())));
    let mut stream = ProxyConnector::new(ProxyType::Socks5, endpoint)
        .connect(&DestinationTarget::new("127.0.0.1", echo.port()))
        .await
        .expect("credentials should be accepted");

    let request = proxy.next_request().await;
    assert_eq!(request.methods, [0x02, 0x00]);
    assert_eq!(request.credentials, Some(("alice".to_owned(), "s3cret".to_owned())));
    assert_echo(&mut stream, 1024).await;
}

#[tokio::test]
async fn test_socks5_credentials_rejected() {
    let proxy = MockProxy::spawn_with_auth(
        MockProtocol::Socks5,
        MockReply::Grant,
        None,
        Some(("alice", "s3cret")),
    )
    .await;

    let endpoint = local(proxy.port()).with_credentials(Credentials::new("alice", Some("wrong".into())));
    let err = ProxyConnector::new(ProxyType::Socks5, endpoint)
        .connect(&DestinationTarget::new("127.0.0.1", 80))
        .await
        .expect_err("wrong password must fail");
    assert!(err.is_proxy());
    assert_eq!(err.to_string(), "Username and password authentication failure");
}

#[tokio::test]
async fn test_socks5_ttl_expired() {
    let proxy = MockProxy::spawn(MockProtocol::Socks5, MockReply::SocksCode(0x06), None).await;

    let err = ProxyConnector::new(ProxyType::Socks5, local(proxy.port()))
        .connect(&DestinationTarget::new("example.com", 80))
        .await
        .expect_err("reply 6 must fail");
    assert!(err.is_proxy());
    assert_eq!(err.status_code(), Some(6));
    assert_eq!(err.to_string(), "TTL expired");
}

#[tokio::test]
async fn test_socks4a_round_trip() {
    let echo = spawn_echo().await;
    let mut proxy = MockProxy::spawn(MockProtocol::Socks4, MockReply::Grant, Some(echo)).await;

    let endpoint = local(proxy.port())
        .with_credentials(Credentials::new("bob", None))
        .with_rdns(true);
    let mut stream = ProxyConnector::new(ProxyType::Socks4, endpoint)
        .connect(&DestinationTarget::new("echo.test", echo.port()))
        .await
        .expect("SOCKS4a tunnel should open");

    let request = proxy.next_request().await;
    assert_eq!(request.target, format!("echo.test:{}", echo.port()));
    assert_eq!(&request.raw[4..8], &[0, 0, 0, 1], "SOCKS4a marker address");
    assert_eq!(request.credentials, Some(("bob".to_owned(), String::new())));
    assert_echo(&mut stream, 2048).await;
}

#[tokio::test]
async fn test_socks4_rejects_ipv6_destination() {
    let proxy = MockProxy::spawn(MockProtocol::Socks4, MockReply::Grant, None).await;

    let err = ProxyConnector::new(ProxyType::Socks4, local(proxy.port()))
        .connect(&DestinationTarget::new("[2001:db8::1]", 443))
        .await
        .expect_err("SOCKS4 has no IPv6");
    assert!(err.is_config(), "expected a config error, got {err:?}");
}

#[tokio::test]
async fn test_http_connect_round_trip() {
    let echo = spawn_echo().await;
    let mut proxy = MockProxy::spawn(MockProtocol::Http, MockReply::Grant, Some(echo)).await;

    let endpoint = local(proxy.port()).with_credentials(Credentials::new("user", Some("pass".into())));
    let mut stream = ProxyConnector::new(ProxyType::Http, endpoint)
        .connect(&DestinationTarget::new("127.0.0.1", echo.port()))
        .await
        .expect("CONNECT should succeed");

    let request = proxy.next_request().await;
    assert_eq!(request.target, format!("127.0.0.1:{}", echo.port()));
    assert_eq!(request.authorization.as_deref(), Some("Basic dXNlcjpwYXNz"));
    assert_echo(&mut stream, 16 * 1024).await;
}

#[tokio::test]
async fn test_http_connect_proxy_auth_required() {
    let proxy = MockProxy::spawn(
        MockProtocol::Http,
        MockReply::HttpStatus("HTTP/1.1 407 Proxy Authentication Required"),
        None,
    )
    .await;

    let err = ProxyConnector::new(ProxyType::Http, local(proxy.port()))
        .connect(&DestinationTarget::new("example.com", 443))
        .await
        .expect_err("407 must fail");
    assert!(err.is_proxy());
    assert_eq!(err.status_code(), Some(407));
    assert!(err.to_string().contains("407"), "message was {err}");
}

#[tokio::test]
async fn test_stalled_proxy_times_out_and_closes_socket() {
    let mut proxy = MockProxy::spawn(MockProtocol::Socks5, MockReply::Stall, None).await;

    let connector = ProxyConnector::new(ProxyType::Socks5, local(proxy.port()))
        .with_config(ConnectConfig::default().with_timeout(Duration::from_millis(200)));
    let started = Instant::now();
    let err = connector
        .connect(&DestinationTarget::new("example.com", 80))
        .await
        .expect_err("silent proxy must time out");

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert_eq!(err.to_string(), "Proxy connection timed out after 200ms");
    assert!(started.elapsed() < Duration::from_secs(5));
    proxy.wait_closed().await;
}

#[tokio::test]
async fn test_pending_dial_times_out() {
    let connector = ProxyConnector::new(ProxyType::Http, local(3128))
        .with_dialer(PendingDialer)
        .with_config(ConnectConfig::default().with_timeout(Duration::from_millis(50)));

    let err = connector
        .connect(&DestinationTarget::new("example.com", 443))
        .await
        .expect_err("dial never completes");
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_unreachable_proxy_is_connection_error() {
    let addr = closed_port().await;

    let err = ProxyConnector::new(ProxyType::Socks5, local(addr.port()))
        .connect(&DestinationTarget::new("example.com", 80))
        .await
        .expect_err("nothing listens on the port");
    assert!(err.is_connect(), "expected connection error, got {err:?}");
    assert!(
        err.to_string()
            .starts_with(&format!("Can not connect to proxy 127.0.0.1:{}", addr.port())),
        "message was {err}"
    );
}

#[tokio::test]
async fn test_proxy_chain_reaches_destination() {
    let echo = spawn_echo().await;
    let mut inner = MockProxy::spawn(MockProtocol::Socks5, MockReply::Grant, Some(echo)).await;
    let mut outer = MockProxy::spawn(MockProtocol::Http, MockReply::Grant, Some(inner.addr)).await;

    let connector = ProxyConnector::new(ProxyType::Http, local(outer.port()))
        .chain(ProxyHop::new(ProxyType::Socks5, local(inner.port())));
    assert_eq!(connector.route().len(), 2);

    let mut stream = connector
        .connect(&DestinationTarget::new("127.0.0.1", echo.port()))
        .await
        .expect("chained tunnel should open");

    assert_eq!(outer.next_request().await.target, format!("127.0.0.1:{}", inner.port()));
    assert_eq!(inner.next_request().await.target, format!("127.0.0.1:{}", echo.port()));
    assert_echo(&mut stream, 4096).await;
}

#[tokio::test]
async fn test_connect_through_proxy_helper() {
    let echo = spawn_echo().await;
    let proxy = MockProxy::spawn(MockProtocol::Http, MockReply::Grant, Some(echo)).await;

    let mut stream = connect_through_proxy(
        &local(proxy.port()),
        ProxyType::Http,
        &DestinationTarget::new("127.0.0.1", echo.port()),
        Some(Duration::from_secs(5)),
    )
    .await
    .expect("helper should open a tunnel");
    assert_echo(&mut stream, 256).await;
}

#[tokio::test]
async fn test_plain_origin_skips_tls() {
    let echo = spawn_echo().await;
    let proxy = MockProxy::spawn(MockProtocol::Socks5, MockReply::Grant, Some(echo)).await;

    let origin = Origin::new(Scheme::Http, "127.0.0.1", Some(echo.port()));
    let stream = ProxyConnector::new(ProxyType::Socks5, local(proxy.port()))
        .connect_origin(&origin)
        .await
        .expect("plain origin should connect");
    assert!(!stream.is_tls());
    assert!(!stream.is_http2());
}

#[tokio::test]
async fn test_https_origin_reports_tls_failure() {
    // An echo server answers the ClientHello with itself, which no client accepts.
    let echo = spawn_echo().await;
    let proxy = MockProxy::spawn(MockProtocol::Socks5, MockReply::Grant, Some(echo)).await;

    let origin = Origin::new(Scheme::Https, "127.0.0.1", Some(echo.port()));
    let err = ProxyConnector::new(ProxyType::Socks5, local(proxy.port()))
        .with_config(ConnectConfig::default().with_timeout(Duration::from_secs(5)))
        .connect_origin(&origin)
        .await
        .expect_err("echoed ClientHello must fail the handshake");
    assert!(err.is_tls(), "expected TLS error, got {err:?}");
}
