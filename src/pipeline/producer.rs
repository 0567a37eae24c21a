//! Frame producer task
//!
//! Periodically pulls a frame from the source, copies it into the inactive
//! buffer slot and publishes the snapshot for the distributor. Suspends
//! itself whenever the distributor has gone idle, so no captures happen
//! while nobody is watching.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::context::{PipelineContext, TaskState};
use super::store::FrameStore;
use crate::source::FrameSource;

/// Periodic capture-and-publish task
///
/// Owns the two-slot [`FrameStore`] outright; the distributor never touches
/// frame storage except through the published snapshot. The source sits
/// behind a mutex because the single-image path captures from it too.
pub struct FrameProducer<S: FrameSource> {
    ctx: Arc<PipelineContext>,
    source: Arc<Mutex<S>>,
    store: FrameStore,
    period: Duration,
}

impl<S: FrameSource> FrameProducer<S> {
    /// Create a producer with the given capture period
    pub fn new(ctx: Arc<PipelineContext>, source: Arc<Mutex<S>>, period: Duration) -> Self {
        Self {
            ctx,
            source,
            store: FrameStore::new(),
            period,
        }
    }

    /// Run the producer until the task is aborted
    ///
    /// Starts `Idle` and waits for an admission wake. A stale wake permit
    /// (admission that raced with an idle transition) is re-checked against
    /// actual demand before resuming.
    pub async fn run(mut self) {
        loop {
            self.ctx.wait_producer_wake().await;
            if self.ctx.distributor_state() == TaskState::Idle
                && self.ctx.queue().is_empty().await
            {
                continue;
            }

            self.ctx.set_producer_state(TaskState::Running);
            tracing::debug!("Frame producer running");
            self.produce_until_idle().await;
            tracing::debug!("Frame producer idle");
        }
    }

    /// One burst of periodic capture cycles, ending with the idle
    /// transition
    ///
    /// The interval is deadline-anchored: ticks fire at `start + n*period`,
    /// so a transiently slow cycle does not push later cycles back. A fresh
    /// interval per burst makes the first capture after a resume immediate.
    async fn produce_until_idle(&mut self) {
        let mut ticker = tokio::time::interval(self.period);

        loop {
            ticker.tick().await;

            {
                let mut source = self.source.lock().await;
                match source.capture().await {
                    Ok(frame) => self.store.load(frame),
                    Err(e) => {
                        tracing::warn!(error = %e, "Frame capture failed, skipping cycle");
                        continue;
                    }
                }
                // source released before the publish swap
            }

            let snapshot = self.store.take_written();
            tracing::trace!(len = snapshot.len(), "Frame published");
            let prev = self.ctx.publish(snapshot).await;
            self.store.restore_and_flip(prev);

            self.ctx.signal_frame_ready();
            tokio::task::yield_now().await;

            if self.ctx.distributor_state() == TaskState::Idle {
                self.ctx.set_producer_state(TaskState::Idle);
                return;
            }
        }
    }
}
