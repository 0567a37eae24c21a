//! Per-connection request handling
//!
//! Reads one request and routes by path: `/` admits the client into the
//! stream queue, `/jpg` serves a single capture, anything else gets the
//! plain-text help page. A connection handler never loops; streaming
//! clients are handed to the distributor and the handler task ends.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::pipeline::{PipelineContext, StreamClient};
use crate::protocol::{multipart, read_request, response};
use crate::source::FrameSource;

/// One accepted connection
pub struct Connection<S: FrameSource> {
    socket: TcpStream,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    ctx: Arc<PipelineContext>,
    source: Arc<Mutex<S>>,
}

impl<S: FrameSource> Connection<S> {
    /// Wrap an accepted socket
    pub fn new(
        socket: TcpStream,
        peer_addr: SocketAddr,
        local_addr: SocketAddr,
        ctx: Arc<PipelineContext>,
        source: Arc<Mutex<S>>,
    ) -> Self {
        Self {
            socket,
            peer_addr,
            local_addr,
            ctx,
            source,
        }
    }

    /// Read the request and dispatch it
    pub async fn run(mut self) -> io::Result<()> {
        let request = match read_request(&mut self.socket).await {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(peer = %self.peer_addr, error = %e, "Malformed request");
                return Ok(());
            }
        };

        tracing::debug!(
            peer = %self.peer_addr,
            method = %request.method,
            path = %request.path,
            "Request"
        );

        match request.path.as_str() {
            "/" => self.open_stream().await,
            "/jpg" => self.single_image().await,
            _ => self.help().await,
        }
    }

    /// Stream admission
    ///
    /// Reserve a queue slot first: at capacity the request is dropped
    /// without a single response byte. Otherwise the multipart preamble
    /// goes out immediately and the client joins the queue, waking the
    /// pipeline tasks if they were idle.
    async fn open_stream(mut self) -> io::Result<()> {
        let Some(permit) = self.ctx.reserve_slot() else {
            tracing::warn!(peer = %self.peer_addr, "Stream rejected: client queue full");
            return Ok(());
        };

        self.socket.write_all(multipart::STREAM_PREAMBLE).await?;
        self.socket.flush().await?;

        let client = StreamClient::new(self.socket, self.peer_addr, permit);
        self.ctx.admit(client).await;
        Ok(())
    }

    /// Single-shot capture
    ///
    /// Captures directly from the source and writes one JPEG response,
    /// bypassing the queue and the published snapshot. Only the source
    /// mutex orders this against a concurrently running producer cycle;
    /// which frame a simultaneous stream observes is unspecified.
    async fn single_image(mut self) -> io::Result<()> {
        let mut source = self.source.lock().await;
        let frame = match source.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(peer = %self.peer_addr, error = %e, "Single capture failed");
                return Ok(());
            }
        };

        self.socket.write_all(response::SINGLE_IMAGE_PREAMBLE).await?;
        self.socket.write_all(frame).await?;
        self.socket.flush().await?;

        self.ctx.add_still_served();
        tracing::debug!(peer = %self.peer_addr, len = frame.len(), "Single image served");
        Ok(())
    }

    /// Catch-all help page listing the stream and single-picture links
    async fn help(mut self) -> io::Result<()> {
        let body = response::help_response(&self.local_addr);
        self.socket.write_all(&body).await?;
        self.socket.flush().await
    }
}
