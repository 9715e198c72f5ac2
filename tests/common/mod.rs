//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ipscope::config::{ProviderConfig, ProviderKind, ServiceConfig, Transport};
use ipscope::lifecycle::Shutdown;
use ipscope::HttpServer;

/// Request line and headers as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path: String,
    pub head: String,
}

/// Programmable upstream. `respond` maps a request path to a status and
/// body; every request is recorded.
pub struct MockUpstream {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let respond = Arc::new(respond);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hits = Arc::new(AtomicUsize::new(0));

        let (task_seen, task_hits) = (seen.clone(), hits.clone());
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let respond = respond.clone();
                let seen = task_seen.clone();
                let hits = task_hits.clone();
                tokio::spawn(async move {
                    let head = read_head(&mut socket).await;
                    let path = head
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    hits.fetch_add(1, Ordering::SeqCst);
                    seen.lock().unwrap().push(SeenRequest { path: path.clone(), head });

                    let (status, body) = respond(&path);
                    let status_text = match status {
                        200 => "200 OK",
                        404 => "404 Not Found",
                        500 => "500 Internal Server Error",
                        503 => "503 Service Unavailable",
                        _ => "200 OK",
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status_text,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, seen, hits }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn hits_to(&self, prefix: &str) -> usize {
        self.seen().iter().filter(|r| r.path.starts_with(prefix)).count()
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Upstream that accepts connections and never answers. Sockets stay open
/// until the test runtime shuts down.
pub struct SilentUpstream {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
}

impl SilentUpstream {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = accepted.clone();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(socket);
            }
        });

        Self { addr, accepted }
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Service config pointing every provider and the detector at `upstream`:
/// geolocation providers at `/geo1`, `/geo2`, `/geo3`, the detector at
/// `/hub`.
pub fn config_for(upstream: &MockUpstream, log_dir: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.security.enforce_https = false;
    config.observability.metrics_enabled = false;
    config.upstream.transport = Transport::Hyper;
    config.upstream.timeout_secs = 2;
    config.event_log.directory = log_dir.to_string_lossy().into_owned();
    config.detection.url = upstream.url("/hub/{ip}");
    config.detection.api_key = Some("test-key".to_string());
    config.geo.providers = vec![
        ProviderConfig {
            name: "ip-api".into(),
            kind: ProviderKind::IpApi,
            url: upstream.url("/geo1/{ip}"),
            token: None,
        },
        ProviderConfig {
            name: "ipwhois".into(),
            kind: ProviderKind::IpWhois,
            url: upstream.url("/geo2/{ip}"),
            token: None,
        },
        ProviderConfig {
            name: "ipinfo".into(),
            kind: ProviderKind::IpInfo,
            url: upstream.url("/geo3/{ip}?token={token}"),
            token: Some("t".into()),
        },
    ];
    config
}

/// A running service and the handle that stops it.
pub struct TestService {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestService {
    pub async fn start(config: ServiceConfig) -> Self {
        let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let server = HttpServer::new(config).unwrap();
        let receiver = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, receiver).await;
        });
        Self { addr, shutdown }
    }

    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
