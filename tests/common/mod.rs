//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use secdownload::config::{AppConfig, DownloadConfig, SettingsHandle};
use secdownload::http::HttpServer;
use secdownload::lifecycle::Shutdown;
use secdownload::token::{sign_link, unix_now};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

pub const SECRET: &str = "integration-secret";
pub const ADMIN_KEY: &str = "integration-admin-key";

/// A running server with its own document root.
pub struct TestServer {
    pub addr: SocketAddr,
    pub admin_addr: Option<SocketAddr>,
    pub settings: SettingsHandle,
    pub updates: mpsc::UnboundedSender<DownloadConfig>,
    pub root: TempDir,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        let addr = self.admin_addr.expect("admin API not enabled");
        format!("http://{addr}{path}")
    }

    /// Write a file under the document root.
    pub fn write_file(&self, rel: &str, contents: &[u8]) {
        let path = self.root.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    /// Signed request path for `file_path`, stamped `age` seconds ago.
    pub fn link(&self, file_path: &str, age: u64) -> String {
        sign_link(&self.settings.load(), file_path, unix_now() - age)
            .unwrap()
            .path
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server on an ephemeral port. `configure` runs after the defaults
/// for tests (secret, root, 60s timeout) are filled in.
pub async fn spawn_server(configure: impl FnOnce(&mut AppConfig)) -> TestServer {
    let root = tempfile::tempdir().unwrap();

    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.download.secret = SECRET.into();
    config.download.root_path = root.path().to_path_buf();
    config.download.timeout = 60;
    configure(&mut config);

    let admin_addr = if config.admin.enabled {
        let addr = free_port();
        config.admin.bind_address = addr.to_string();
        config.admin.api_key = ADMIN_KEY.into();
        Some(addr)
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config);
    let settings = server.settings();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    if let Some(admin) = admin_addr {
        wait_for(admin).await;
    }

    TestServer {
        addr,
        admin_addr,
        settings,
        updates,
        root,
        shutdown,
    }
}

fn free_port() -> SocketAddr {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    probe.local_addr().unwrap()
}

async fn wait_for(addr: SocketAddr) {
    for _ in 0..100 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {addr} never came up");
}

/// Send a request line verbatim and return the status code.
///
/// HTTP clients normalize dot segments and escapes, so traversal and
/// malformed-encoding cases go through this instead of reqwest.
pub async fn raw_get(addr: SocketAddr, target: &str) -> u16 {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or_else(|| panic!("no status line in {response:?}"))
}

/// Poll until `check` holds or a second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..50 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached in time");
}
