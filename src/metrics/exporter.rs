//! Prometheus scrape endpoint
//!
//! Minimal HTTP/1.1 server answering `GET /metrics` with the current
//! registry contents. Every scrape renders fresh; nothing is cached.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use super::registry::MetricsRegistry;
use crate::util::create_tcp_listener;

/// Content type of the Prometheus text exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const METRICS_PATH: &str = "/metrics";
const MAX_REQUEST_HEAD: usize = 8192;
/// Time a client gets to send its request head
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Scrape endpoint bound to a local address
pub struct Exporter {
    listener: TcpListener,
    registry: Arc<MetricsRegistry>,
}

impl Exporter {
    /// Bind the scrape listener. Must be called inside a tokio runtime.
    pub fn bind(addr: SocketAddr, registry: Arc<MetricsRegistry>) -> Result<Self> {
        let listener = create_tcp_listener(addr)
            .with_context(|| format!("Failed to bind metrics endpoint on {}", addr))?;
        let listener = TcpListener::from_std(listener)?;

        Ok(Self { listener, registry })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve scrape requests forever
    pub async fn serve(self) -> Result<()> {
        info!(addr = %self.local_addr()?, path = METRICS_PATH, "Metrics endpoint started");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let registry = self.registry.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_request(stream, &registry).await {
                            debug!(error = %e, %peer, "Scrape request error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

async fn handle_request<S>(mut stream: S, registry: &MetricsRegistry) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; MAX_REQUEST_HEAD];

    let len = match tokio::time::timeout(READ_TIMEOUT, read_head(&mut stream, &mut buffer)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "timed out reading request head",
            ))
        }
    };

    if len == 0 {
        return Ok(());
    }

    let request = String::from_utf8_lossy(&buffer[..len]);
    let first_line = request.lines().next().unwrap_or("");
    let mut parts = first_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("/");

    let (status, content_type, body) = respond(method, target, registry);

    let head = format!(
        "HTTP/1.1 {}\r\n\
         Content-Type: {}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        status,
        content_type,
        body.len(),
    );

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body.as_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await?;

    Ok(())
}

/// Read until the end of the request head; scrapes carry no body
async fn read_head<S: AsyncRead + Unpin>(stream: &mut S, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut len = 0;
    loop {
        let n = stream.read(&mut buffer[len..]).await?;
        if n == 0 {
            return Ok(len);
        }
        len += n;
        if buffer[..len].windows(4).any(|w| w == b"\r\n\r\n") || len == buffer.len() {
            return Ok(len);
        }
    }
}

/// Route one request to a status line, content type and body
fn respond(method: &str, target: &str, registry: &MetricsRegistry) -> (&'static str, &'static str, String) {
    // Query strings are ignored, as Prometheus may add them
    let path = target.split('?').next().unwrap_or(target);

    match (method, path) {
        ("GET", METRICS_PATH) => ("200 OK", CONTENT_TYPE, registry.render()),
        (_, METRICS_PATH) => (
            "405 Method Not Allowed",
            "text/plain; charset=utf-8",
            "Method Not Allowed\n".to_string(),
        ),
        _ => ("404 Not Found", "text/plain; charset=utf-8", "Not Found\n".to_string()),
    }
}
