//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use signage_edge::config::EdgeConfig;
use signage_edge::http::EdgeServer;
use signage_edge::lifecycle::Shutdown;

/// What a mock backend saw on the request line.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub target: String,
}

/// Start a mock renderer that echoes `METHOD TARGET` as the response body.
pub async fn start_echo_renderer(addr: SocketAddr) {
    start_programmable_backend(addr, |seen: Seen| async move {
        (200, format!("{} {}", seen.method, seen.target))
    })
    .await;
}

/// Start a programmable mock backend. The closure receives the request line
/// and returns the status and body.
pub async fn start_programmable_backend<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn(Seen) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(seen) = read_request_line(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(seen).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

async fn read_request_line(socket: &mut TcpStream) -> Option<Seen> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let mut parts = head.lines().next()?.split_whitespace();
    Some(Seen {
        method: parts.next()?.to_string(),
        target: parts.next()?.to_string(),
    })
}

/// Config bound to `edge_addr` and forwarding to `renderer_addr`.
pub fn edge_config(edge_addr: SocketAddr, renderer_addr: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.listener.bind_address = edge_addr.to_string();
    config.upstream.address = renderer_addr.to_string();
    config.locales.codes = vec!["en-us".into(), "fr-ca".into()];
    config.locales.default = "en-us".into();
    config
}

/// Start the edge in the background. Trigger the returned handle to stop it.
pub async fn start_edge(config: EdgeConfig) -> Shutdown {
    let addr: SocketAddr = config.listener.bind_address.parse().unwrap();
    let shutdown = Shutdown::new();
    let server = EdgeServer::new(config).unwrap();
    let listener = TcpListener::bind(addr).await.unwrap();

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown
}

/// Client that neither follows redirects nor uses a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
