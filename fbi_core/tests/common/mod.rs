#![allow(dead_code)]

use fbi_core::{AppEvent, TransferConfig};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter("fbi_core=debug")
        .with_test_writer()
        .try_init()
        .ok();
}

/// Port with nothing listening on it (bound then released)
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().unwrap().port()
}

pub fn loopback_config(target_port: u16, host_port: u16) -> TransferConfig {
    TransferConfig {
        target_ip: "127.0.0.1".to_string(),
        target_port,
        host_ip: "127.0.0.1".to_string(),
        host_port,
        shutdown_grace: Duration::from_secs(5),
        connect_timeout: Some(Duration::from_secs(2)),
    }
}

/// Fake homebrew loader listening for the URL list
pub struct FakeDevice {
    listener: TcpListener,
}

impl FakeDevice {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake device");
        Self { listener }
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().unwrap().port()
    }

    /// Accept the sender and read its URL list, keeping the socket open
    pub async fn accept_urls(self) -> (TcpStream, Vec<String>) {
        let (mut socket, _) = self.listener.accept().await.expect("accept sender");
        let payload = fbi_core::transfer::read_frame(&mut socket)
            .await
            .expect("read url frame");
        let urls = payload.lines().map(str::to_string).collect();
        (socket, urls)
    }
}

/// Plain HTTP/1.1 GET of a manifest URL (`host:port/path`), returning the raw response
pub async fn http_get(url: &str) -> String {
    let (authority, path) = url.split_once('/').expect("url has a path");
    let mut stream = TcpStream::connect(authority).await.expect("connect to file server");
    let request = format!(
        "GET /{} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, authority
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Request a manifest URL and read only the status line, leaving the body unread
pub async fn start_download(url: &str) -> TcpStream {
    let (authority, path) = url.split_once('/').expect("url has a path");
    let mut stream = TcpStream::connect(authority).await.expect("connect to file server");
    let request = format!("GET /{} HTTP/1.1\r\nHost: {}\r\n\r\n", path, authority);
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut head = [0u8; 12];
    stream.read_exact(&mut head).await.unwrap();
    assert_eq!(&head, b"HTTP/1.1 200");
    stream
}

pub fn drain(mut rx: mpsc::Receiver<AppEvent>) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
