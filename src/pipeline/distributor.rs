//! Frame distributor task
//!
//! Serves the current published frame to queued clients round-robin. The
//! service rate degrades linearly with client count: with `C` clients the
//! per-cycle period is `base_period / C`, so every client is served once
//! per `base_period` regardless of how many there are, with no rate floor.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::context::{PipelineContext, TaskState};

/// Periodic fan-out task
pub struct FrameDistributor {
    ctx: Arc<PipelineContext>,
    base_period: Duration,
}

impl FrameDistributor {
    /// Create a distributor with the given base service period
    pub fn new(ctx: Arc<PipelineContext>, base_period: Duration) -> Self {
        Self { ctx, base_period }
    }

    /// Run the distributor until the task is aborted
    ///
    /// Startup blocks on the first admission and then on the first "frame
    /// ready" signal, so a client can never be served before any frame
    /// exists. After that the published snapshot persists and resumes skip
    /// the gate.
    pub async fn run(self) {
        self.ctx.wait_distributor_wake().await;
        self.ctx.set_distributor_state(TaskState::Running);
        self.ctx.wait_frame_ready().await;
        tracing::debug!("Frame distributor entering steady state");

        let mut deadline = Instant::now();
        loop {
            let clients = self.ctx.queue().len().await;
            if clients == 0 {
                self.ctx.set_distributor_state(TaskState::Idle);
                tracing::debug!("Frame distributor idle");
                self.ctx.wait_distributor_wake().await;
                self.ctx.set_distributor_state(TaskState::Running);
                tracing::debug!("Frame distributor running");
                deadline = Instant::now();
                continue;
            }

            self.serve_next().await;
            tokio::task::yield_now().await;

            // Deadline-anchored tick; an overrun re-anchors to now instead
            // of accumulating drift
            deadline += self.base_period / clients as u32;
            let now = Instant::now();
            if deadline < now {
                deadline = now;
            }
            tokio::time::sleep_until(deadline).await;
        }
    }

    /// Serve one client from the front of the queue
    ///
    /// A client found disconnected is discarded permanently; a connected
    /// one is served the published frame under the guard and re-enqueued
    /// at the back.
    async fn serve_next(&self) {
        let Some(mut client) = self.ctx.queue().pop().await else {
            return;
        };

        if !client.is_connected().await {
            self.ctx.add_client_dropped();
            tracing::info!(
                peer = %client.peer_addr(),
                frames_sent = client.frames_sent(),
                "Stream client disconnected"
            );
            return;
        }

        let published = self.ctx.lock_published().await;
        let result = match published.frame() {
            Some(frame) => client.send_frame(frame).await,
            None => Ok(()),
        };
        drop(published);

        match result {
            Ok(()) => {
                self.ctx.add_frame_served();
                tracing::trace!(peer = %client.peer_addr(), "Frame served");
                self.ctx.queue().push(client).await;
            }
            Err(e) => {
                self.ctx.add_client_dropped();
                tracing::debug!(
                    peer = %client.peer_addr(),
                    error = %e,
                    "Dropping client after write error"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::io::{AsyncReadExt, DuplexStream};

    use crate::pipeline::queue::StreamClient;
    use crate::source::MockSource;

    use super::*;

    const BASE_PERIOD: Duration = Duration::from_millis(100);

    fn spawn_distributor(capacity: usize) -> Arc<PipelineContext> {
        let ctx = Arc::new(PipelineContext::new(capacity));
        let distributor = FrameDistributor::new(Arc::clone(&ctx), BASE_PERIOD);
        tokio::spawn(distributor.run());
        ctx
    }

    async fn admit_client(ctx: &Arc<PipelineContext>, port: u16) -> DuplexStream {
        let permit = ctx.reserve_slot().expect("slot available");
        let (near, far) = tokio::io::duplex(1 << 20);
        let addr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), port);
        ctx.admit(StreamClient::new(near, addr, permit)).await;
        far
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_first_frame() {
        let ctx = spawn_distributor(4);
        let mut far = admit_client(&ctx, 1).await;

        // Admitted but no frame published yet: nothing must be written
        tokio::time::sleep(BASE_PERIOD * 3).await;
        assert_eq!(ctx.stats().await.frames_served, 0);

        ctx.publish(Bytes::from(MockSource::expected_frame(1, 32))).await;
        ctx.signal_frame_ready();
        tokio::time::sleep(BASE_PERIOD).await;
        assert!(ctx.stats().await.frames_served >= 1);

        let mut header = vec![0u8; 2];
        far.read_exact(&mut header).await.unwrap();
        assert_eq!(&header, b"Co");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_is_byte_identical() {
        let ctx = spawn_distributor(4);
        let mut far = admit_client(&ctx, 1).await;

        let frame = MockSource::expected_frame(7, 500);
        ctx.publish(Bytes::from(frame.clone())).await;
        ctx.signal_frame_ready();
        tokio::time::sleep(BASE_PERIOD / 2).await;

        let header = b"Content-Type: image/jpeg\r\nContent-Length: 500\r\n\r\n";
        let mut received = vec![0u8; header.len() + 500];
        far.read_exact(&mut received).await.unwrap();
        assert_eq!(&received[..header.len()], header);
        assert_eq!(&received[header.len()..], &frame[..]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_period_divides_by_client_count() {
        let ctx = spawn_distributor(4);
        let _far1 = admit_client(&ctx, 1).await;
        let _far2 = admit_client(&ctx, 2).await;

        ctx.publish(Bytes::from(vec![0u8; 64])).await;
        ctx.signal_frame_ready();

        tokio::time::sleep(BASE_PERIOD * 10).await;
        let served = ctx.stats().await.frames_served;
        // Two clients: one serve every base_period/2, so ~20 over 10 periods
        assert!((17..=24).contains(&served), "served {}", served);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnected_client_is_discarded() {
        let ctx = spawn_distributor(4);
        let far = admit_client(&ctx, 1).await;
        drop(far);

        ctx.publish(Bytes::from(vec![0u8; 16])).await;
        ctx.signal_frame_ready();
        tokio::time::sleep(BASE_PERIOD * 2).await;

        let stats = ctx.stats().await;
        assert_eq!(stats.clients_dropped, 1);
        assert_eq!(stats.queued_clients, 0);
        assert_eq!(stats.frames_served, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_when_queue_drains_and_resumes_on_admission() {
        let ctx = spawn_distributor(4);
        let far = admit_client(&ctx, 1).await;

        ctx.publish(Bytes::from(vec![0u8; 16])).await;
        ctx.signal_frame_ready();
        tokio::time::sleep(BASE_PERIOD * 2).await;
        assert_eq!(ctx.distributor_state(), TaskState::Running);

        drop(far);
        tokio::time::sleep(BASE_PERIOD * 3).await;
        assert_eq!(ctx.distributor_state(), TaskState::Idle);

        // Re-admission resumes service without a new frame-ready gate
        let mut far = admit_client(&ctx, 2).await;
        tokio::time::sleep(BASE_PERIOD).await;
        assert_eq!(ctx.distributor_state(), TaskState::Running);
        let mut byte = [0u8; 1];
        far.read_exact(&mut byte).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_robin_serves_every_client() {
        let ctx = spawn_distributor(4);
        let mut far1 = admit_client(&ctx, 1).await;
        let mut far2 = admit_client(&ctx, 2).await;
        let mut far3 = admit_client(&ctx, 3).await;

        ctx.publish(Bytes::from(vec![9u8; 8])).await;
        ctx.signal_frame_ready();

        // One full rotation serves each queued client exactly once per
        // base period
        tokio::time::sleep(BASE_PERIOD + BASE_PERIOD / 3).await;
        for far in [&mut far1, &mut far2, &mut far3] {
            let mut byte = [0u8; 1];
            far.read_exact(&mut byte).await.unwrap();
        }
    }
}
