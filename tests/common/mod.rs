//! Shared fixtures: a fake `uv` executable and a throwaway HTTP server.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Env var the fake converter writes its input argument to.
pub const RECORD_ENV: &str = "MARKDOWNIFY_TEST_RECORD";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Write an executable `/bin/sh` script named `uv` into `dir`.
///
/// The script is written under a scratch name and renamed into place so no
/// writer is open on `uv` itself when it is executed (`ETXTBSY`).
#[cfg(unix)]
pub fn fake_uv(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let staging = dir.join(".uv.partial");
    std::fs::write(&staging, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o755)).unwrap();

    let path = dir.join("uv");
    std::fs::rename(&staging, &path).unwrap();
    path
}

/// Converter that records its input path and echoes the file back.
///
/// Arguments arrive as `run --project <root> markitdown <input>`, so the
/// input is `$5`.
#[cfg(unix)]
pub fn echoing_uv(dir: &Path) -> PathBuf {
    fake_uv(
        dir,
        &format!("printf '%s' \"$5\" > \"${RECORD_ENV}\"\ncat \"$5\""),
    )
}

/// Converter that records its input, prints a warning on stderr and exits 0.
#[cfg(unix)]
pub fn warning_uv(dir: &Path) -> PathBuf {
    fake_uv(
        dir,
        &format!(
            "printf '%s' \"$5\" > \"${RECORD_ENV}\"\necho '# fine'\necho 'UserWarning: ffmpeg not found' >&2\nexit 0"
        ),
    )
}

/// What one route answers.
#[derive(Clone)]
pub enum Reply {
    Ok(Vec<u8>),
    Status(u16),
    /// Accept the connection and never answer.
    Hang,
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serve `routes` (path → reply) on an ephemeral localhost port.
/// Unknown paths get a 404.
pub async fn serve(routes: Vec<(&'static str, Reply)>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let routes = Arc::new(routes);

    let counter = Arc::clone(&hits);
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let path = read_request_path(&mut socket).await;
                let reply = routes
                    .iter()
                    .find(|(p, _)| *p == path)
                    .map(|(_, r)| r.clone())
                    .unwrap_or(Reply::Status(404));

                let (status, body) = match reply {
                    Reply::Ok(body) => (200, body),
                    Reply::Status(code) => (code, b"nope".to_vec()),
                    Reply::Hang => {
                        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                        return;
                    }
                };
                let head = format!(
                    "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    TestServer { addr, hits }
}

/// Read request headers and return the path without its query string.
async fn read_request_path(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") && buf.len() < 16 * 1024 {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let text = String::from_utf8_lossy(&buf);
    let target = text
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");
    target.split('?').next().unwrap_or("/").to_string()
}
