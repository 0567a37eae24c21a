//! MJPEG server listener
//!
//! Binds the socket, spawns the two long-lived pipeline tasks and runs the
//! TCP accept loop. Connection handlers are spawned per accept; the
//! producer and distributor exist for the lifetime of the server, never
//! per request.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::pipeline::{FrameDistributor, FrameProducer, PipelineContext};
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::source::FrameSource;
use crate::stats::ServerStats;

/// MJPEG streaming server
pub struct StreamServer<S: FrameSource> {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    ctx: Arc<PipelineContext>,
    source: Arc<Mutex<S>>,
}

impl<S: FrameSource> StreamServer<S> {
    /// Bind the listener and configure the source
    ///
    /// Applies the configured resolution and encoder quality to the source
    /// before anything is served. Binding to port 0 picks an ephemeral
    /// port; see [`local_addr`](Self::local_addr).
    pub async fn bind(config: ServerConfig, mut source: S) -> Result<Self> {
        source.set_frame_size(config.frame_size);
        source.set_quality(config.jpeg_quality);
        tracing::info!(
            width = source.width(),
            height = source.height(),
            quality = config.jpeg_quality,
            frame_rate = config.frame_rate,
            "Camera configured"
        );

        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "MJPEG server listening");

        let ctx = Arc::new(PipelineContext::new(config.max_clients));

        Ok(Self {
            config,
            listener,
            local_addr,
            ctx,
            source: Arc::new(Mutex::new(source)),
        })
    }

    /// The actual bound address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Snapshot of the pipeline counters and task states
    pub async fn stats(&self) -> ServerStats {
        self.ctx.stats().await
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let _pipeline = self.spawn_pipeline();
        self.accept_loop().await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let (producer, distributor) = self.spawn_pipeline();

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop() => result,
        };

        producer.abort();
        distributor.abort();

        result
    }

    fn spawn_pipeline(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        let producer = FrameProducer::new(
            Arc::clone(&self.ctx),
            Arc::clone(&self.source),
            self.config.frame_period(),
        );
        let distributor = FrameDistributor::new(Arc::clone(&self.ctx), self.config.frame_period());

        (tokio::spawn(producer.run()), tokio::spawn(distributor.run()))
    }

    async fn accept_loop(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        tracing::debug!(peer = %peer_addr, "New connection");

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        // Help links are built from the address the client reached us on
        let local_addr = socket.local_addr().unwrap_or(self.local_addr);

        let connection = Connection::new(
            socket,
            peer_addr,
            local_addr,
            Arc::clone(&self.ctx),
            Arc::clone(&self.source),
        );

        tokio::spawn(async move {
            if let Err(e) = connection.run().await {
                tracing::debug!(peer = %peer_addr, error = %e, "Connection error");
            }
        });
    }
}
