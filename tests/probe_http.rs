//! Probes against a local fake HTTP proxy

use proxy_sieve::{
    CheckerConfig, Endpoint, HttpProber, ProbeError, Prober, ProxyAddress, ProxyChecker,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const OK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";
const REDIRECT: &str = "HTTP/1.1 302 Found\r\nLocation: http://example.test/ok\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
const SERVER_ERROR: &str = "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

type Requests = Arc<Mutex<Vec<String>>>;

/// Fake forward proxy answering by request path
async fn spawn_proxy() -> (ProxyAddress, Requests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let requests: Requests = Arc::default();

    let seen = Arc::clone(&requests);
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(handle(socket, Arc::clone(&seen)));
        }
    });

    (addr.to_string().parse().unwrap(), requests)
}

async fn handle(mut socket: TcpStream, seen: Requests) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let request = String::from_utf8_lossy(&buf).to_string();
    let request_line = request.lines().next().unwrap_or_default().to_string();
    seen.lock().unwrap().push(request);

    let response = if request_line.contains("/stall") {
        tokio::time::sleep(Duration::from_secs(30)).await;
        return;
    } else if request_line.contains("/redirect") {
        REDIRECT
    } else if request_line.contains("/error") {
        SERVER_ERROR
    } else {
        OK
    };
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn prober() -> HttpProber {
    HttpProber::new("proxy-sieve-test")
}

#[tokio::test]
async fn test_probe_passes_on_200() {
    let (proxy, requests) = spawn_proxy().await;

    let result = prober()
        .probe(&proxy, "http://example.test/ok", Duration::from_secs(5), true)
        .await;

    assert!(result.is_success(), "{:?}", result);
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("GET http://example.test/ok"));
    assert!(requests[0]
        .to_ascii_lowercase()
        .contains("user-agent: proxy-sieve-test"));
}

#[tokio::test]
async fn test_probe_rejects_redirect_when_forbidden() {
    let (proxy, requests) = spawn_proxy().await;

    let result = prober()
        .probe(&proxy, "http://example.test/redirect", Duration::from_secs(5), true)
        .await;

    assert_eq!(result.outcome, Err(ProbeError::Status(302)));
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_probe_follows_redirect_when_allowed() {
    let (proxy, requests) = spawn_proxy().await;

    let result = prober()
        .probe(&proxy, "http://example.test/redirect", Duration::from_secs(5), false)
        .await;

    assert!(result.is_success(), "{:?}", result);
    assert_eq!(requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_probe_rejects_server_error() {
    let (proxy, _) = spawn_proxy().await;

    let result = prober()
        .probe(&proxy, "http://example.test/error", Duration::from_secs(5), false)
        .await;

    assert_eq!(result.outcome, Err(ProbeError::Status(500)));
}

#[tokio::test]
async fn test_probe_times_out() {
    let (proxy, _) = spawn_proxy().await;

    let result = prober()
        .probe(&proxy, "http://example.test/stall", Duration::from_millis(300), false)
        .await;

    assert_eq!(result.outcome, Err(ProbeError::Timeout));
    assert!(result.elapsed_ms >= 250);
}

fn checker(liveness: &str, consistency: &str) -> ProxyChecker {
    let timeout = Duration::from_secs(5);
    let config = CheckerConfig::new()
        .with_pause(Duration::from_millis(10))
        .with_user_agent("proxy-sieve-test".to_string())
        .with_liveness(Endpoint::new("LIVE", liveness, timeout, 1))
        .with_consistency(Endpoint::new("CONSIST", consistency, timeout, 2));
    ProxyChecker::with_config(config)
}

#[tokio::test]
async fn test_pipeline_accepts_healthy_proxy() {
    let (proxy, requests) = spawn_proxy().await;

    let record = checker("http://example.test/ok", "http://example.test/ok")
        .validate(&proxy)
        .await
        .expect("proxy should pass");

    assert_eq!(record.proxy, proxy);
    assert_eq!(
        record.avg_total_ms,
        (record.liveness_ms + record.consistency1_ms + record.consistency2_ms) / 3
    );
    assert_eq!(requests.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_pipeline_rejects_redirecting_consistency_endpoint() {
    let (proxy, requests) = spawn_proxy().await;

    let record = checker("http://example.test/ok", "http://example.test/redirect")
        .validate(&proxy)
        .await;

    assert!(record.is_none());
    assert_eq!(requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_pipeline_short_circuits_on_dead_liveness() {
    let (proxy, requests) = spawn_proxy().await;

    let record = checker("http://example.test/error", "http://example.test/ok")
        .validate(&proxy)
        .await;

    assert!(record.is_none());
    assert_eq!(requests.lock().unwrap().len(), 1);
}
