// src/serve/mod.rs

//! Preview server.
//!
//! Serves the output directory on `127.0.0.1:<port>` and pushes `reload`
//! events to connected pages over server-sent events whenever the watch loop
//! finishes a rebuild.

pub mod http;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::errors::Result;

use self::http::{
    content_type, inject_reload_script, parse_request_line, resolve_path, response_head,
    LIVERELOAD_PATH,
};

/// Sends reload notifications to every connected preview page.
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: broadcast::Sender<()>,
}

impl ReloadHandle {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self { tx }
    }

    /// Notify all clients. Returns how many were connected.
    pub fn notify(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for ReloadHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct PreviewServer {
    listener: TcpListener,
    root: Arc<PathBuf>,
    reload: ReloadHandle,
}

impl PreviewServer {
    /// Bind `127.0.0.1:port` (0 picks a free port) to serve `root`.
    pub async fn bind(root: PathBuf, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let server = Self {
            listener,
            root: Arc::new(root),
            reload: ReloadHandle::new(),
        };
        info!(
            addr = %server.local_addr()?,
            root = %server.root.display(),
            "preview server listening"
        );
        Ok(server)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn reload_handle(&self) -> ReloadHandle {
        self.reload.clone()
    }

    /// Accept connections until the task is aborted.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let root = Arc::clone(&self.root);
                    let reload = self.reload.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &root, reload).await {
                            debug!(%peer, error = %e, "preview connection ended with error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "failed to accept preview connection"),
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    root: &std::path::Path,
    reload: ReloadHandle,
) -> Result<()> {
    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        return Ok(());
    }
    let request = String::from_utf8_lossy(&buf[..n]);

    let Some((method, path)) = parse_request_line(&request) else {
        return send(&mut stream, "400 Bad Request", "text/plain", b"Bad Request").await;
    };
    if method != "GET" && method != "HEAD" {
        return send(&mut stream, "405 Method Not Allowed", "text/plain", b"Method Not Allowed").await;
    }

    if path == LIVERELOAD_PATH {
        return stream_reload_events(stream, reload).await;
    }

    let Some(file) = resolve_path(root, path) else {
        debug!(path, "preview 404");
        return send(&mut stream, "404 Not Found", "text/plain", b"Not Found").await;
    };

    let ct = content_type(&file);
    let mut body = tokio::fs::read(&file).await?;
    if ct.starts_with("text/html") {
        body = inject_reload_script(&String::from_utf8_lossy(&body)).into_bytes();
    }
    if method == "HEAD" {
        stream
            .write_all(response_head("200 OK", ct, body.len()).as_bytes())
            .await?;
        return Ok(());
    }
    send(&mut stream, "200 OK", ct, &body).await
}

async fn send(stream: &mut TcpStream, status: &str, ct: &str, body: &[u8]) -> Result<()> {
    stream
        .write_all(response_head(status, ct, body.len()).as_bytes())
        .await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    Ok(())
}

async fn stream_reload_events(mut stream: TcpStream, reload: ReloadHandle) -> Result<()> {
    let mut rx = reload.subscribe();
    stream
        .write_all(
            b"HTTP/1.1 200 OK\r\n\
              Content-Type: text/event-stream\r\n\
              Cache-Control: no-cache\r\n\
              Connection: keep-alive\r\n\
              \r\n\
              : connected\n\n",
        )
        .await?;
    stream.flush().await?;

    loop {
        match rx.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                stream.write_all(b"event: reload\ndata: {}\n\n").await?;
                stream.flush().await?;
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}
