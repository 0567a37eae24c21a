//! Shared pipeline context
//!
//! One explicit object owns everything the producer, the distributor and
//! the connection handlers share: the guarded published snapshot, the wake
//! and frame-ready signals, both task states, the client queue and the
//! counters. The supervising server holds it in an `Arc` and passes it to
//! both tasks, so each side can also be driven in isolation under test.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use bytes::Bytes;
use tokio::sync::{Mutex, MutexGuard, Notify, OwnedSemaphorePermit};

use super::queue::{ClientQueue, StreamClient};
use crate::stats::ServerStats;

/// Cooperative power state of a pipeline task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    /// Suspended; no captures or service attempts until resumed
    #[default]
    Idle,
    /// Actively producing or distributing frames
    Running,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        if value == 0 {
            TaskState::Idle
        } else {
            TaskState::Running
        }
    }
}

/// Atomic cell holding a [`TaskState`]
#[derive(Debug, Default)]
struct StateCell(AtomicU8);

impl StateCell {
    fn get(&self) -> TaskState {
        TaskState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: TaskState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// The `{ptr, len}` snapshot of the most recent complete frame
///
/// Mutated only by the producer, read only by the distributor, always
/// under the guard. `None` until the first frame is published.
#[derive(Debug, Default)]
pub struct PublishedFrame {
    data: Option<Bytes>,
}

impl PublishedFrame {
    /// The published frame bytes, if any frame has been published yet
    pub fn frame(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }
}

/// Shared state of the frame pipeline
pub struct PipelineContext {
    /// The single shared mutable resource, behind the one binary guard
    published: Mutex<PublishedFrame>,

    /// Saturating one-shot "frame ready" signal; redundant signals while
    /// the distributor is already active are no-ops
    frame_ready: Notify,

    /// Resume signal for the idle producer
    producer_wake: Notify,

    /// Resume signal for the idle distributor
    distributor_wake: Notify,

    producer_state: StateCell,
    distributor_state: StateCell,

    queue: ClientQueue,

    frames_produced: AtomicU64,
    frames_served: AtomicU64,
    stills_served: AtomicU64,
    clients_admitted: AtomicU64,
    clients_rejected: AtomicU64,
    clients_dropped: AtomicU64,
}

impl PipelineContext {
    /// Create a context with a client queue of the given capacity
    ///
    /// Both tasks start `Idle`.
    pub fn new(max_clients: usize) -> Self {
        Self {
            published: Mutex::new(PublishedFrame::default()),
            frame_ready: Notify::new(),
            producer_wake: Notify::new(),
            distributor_wake: Notify::new(),
            producer_state: StateCell::default(),
            distributor_state: StateCell::default(),
            queue: ClientQueue::new(max_clients),
            frames_produced: AtomicU64::new(0),
            frames_served: AtomicU64::new(0),
            stills_served: AtomicU64::new(0),
            clients_admitted: AtomicU64::new(0),
            clients_rejected: AtomicU64::new(0),
            clients_dropped: AtomicU64::new(0),
        }
    }

    /// The client queue
    pub fn queue(&self) -> &ClientQueue {
        &self.queue
    }

    // --- published snapshot ---

    /// Swap a freshly written frame into the published snapshot
    ///
    /// Returns the previous snapshot so its storage can be reclaimed. The
    /// guard is held only for the swap itself; pointer and length change
    /// together or not at all.
    pub async fn publish(&self, frame: Bytes) -> Option<Bytes> {
        let prev = self.published.lock().await.data.replace(frame);
        self.frames_produced.fetch_add(1, Ordering::Relaxed);
        prev
    }

    /// Lock the published snapshot for one serialize-and-send
    pub async fn lock_published(&self) -> MutexGuard<'_, PublishedFrame> {
        self.published.lock().await
    }

    /// Signal that a complete frame is available
    pub fn signal_frame_ready(&self) {
        self.frame_ready.notify_one();
    }

    /// Wait for the next "frame ready" signal
    pub async fn wait_frame_ready(&self) {
        self.frame_ready.notified().await;
    }

    // --- task states and wake signals ---

    /// Current producer state
    pub fn producer_state(&self) -> TaskState {
        self.producer_state.get()
    }

    /// Current distributor state
    pub fn distributor_state(&self) -> TaskState {
        self.distributor_state.get()
    }

    /// Set the producer state
    pub fn set_producer_state(&self, state: TaskState) {
        self.producer_state.set(state);
    }

    /// Set the distributor state
    pub fn set_distributor_state(&self, state: TaskState) {
        self.distributor_state.set(state);
    }

    /// Resume an idle producer
    pub fn wake_producer(&self) {
        self.producer_wake.notify_one();
    }

    /// Block until the producer is resumed
    pub async fn wait_producer_wake(&self) {
        self.producer_wake.notified().await;
    }

    /// Resume an idle distributor
    pub fn wake_distributor(&self) {
        self.distributor_wake.notify_one();
    }

    /// Block until the distributor is resumed
    pub async fn wait_distributor_wake(&self) {
        self.distributor_wake.notified().await;
    }

    // --- admission ---

    /// Try to reserve a queue slot for a new stream client
    ///
    /// `None` means the queue is at capacity and the request is silently
    /// dropped; nothing has been written to the client at this point.
    pub fn reserve_slot(&self) -> Option<OwnedSemaphorePermit> {
        match self.queue.try_reserve() {
            Some(permit) => Some(permit),
            None => {
                self.clients_rejected.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Enqueue an admitted client and resume both pipeline tasks
    pub async fn admit(&self, client: StreamClient) {
        let peer = client.peer_addr();
        self.queue.push(client).await;
        self.clients_admitted.fetch_add(1, Ordering::Relaxed);

        self.set_producer_state(TaskState::Running);
        self.set_distributor_state(TaskState::Running);
        self.wake_producer();
        self.wake_distributor();

        let queued = self.queue.len().await;
        tracing::info!(peer = %peer, queued = queued, "Stream client admitted");
    }

    // --- counters ---

    pub(crate) fn add_frame_served(&self) {
        self.frames_served.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_still_served(&self) {
        self.stills_served.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_client_dropped(&self) {
        self.clients_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the pipeline counters and task states
    pub async fn stats(&self) -> ServerStats {
        ServerStats {
            frames_produced: self.frames_produced.load(Ordering::Relaxed),
            frames_served: self.frames_served.load(Ordering::Relaxed),
            stills_served: self.stills_served.load(Ordering::Relaxed),
            clients_admitted: self.clients_admitted.load(Ordering::Relaxed),
            clients_rejected: self.clients_rejected.load(Ordering::Relaxed),
            clients_dropped: self.clients_dropped.load(Ordering::Relaxed),
            queued_clients: self.queue.len().await,
            producer_state: self.producer_state(),
            distributor_state: self.distributor_state(),
        }
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("producer_state", &self.producer_state.get())
            .field("distributor_state", &self.distributor_state.get())
            .field("queue_capacity", &self.queue.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn test_publish_returns_previous_snapshot() {
        let ctx = PipelineContext::new(4);

        assert!(ctx.publish(Bytes::from_static(b"first")).await.is_none());
        let prev = ctx.publish(Bytes::from_static(b"second")).await.unwrap();
        assert_eq!(&prev[..], b"first");

        let published = ctx.lock_published().await;
        assert_eq!(&published.frame().unwrap()[..], b"second");
    }

    #[tokio::test]
    async fn test_no_frame_before_first_publish() {
        let ctx = PipelineContext::new(4);
        assert!(ctx.lock_published().await.frame().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_ready_signal_saturates() {
        let ctx = PipelineContext::new(4);

        // Redundant signals collapse into a single stored permit
        ctx.signal_frame_ready();
        ctx.signal_frame_ready();
        ctx.signal_frame_ready();

        timeout(Duration::from_millis(10), ctx.wait_frame_ready())
            .await
            .expect("one permit is stored");
        timeout(Duration::from_millis(10), ctx.wait_frame_ready())
            .await
            .expect_err("redundant signals were no-ops");
    }

    #[tokio::test]
    async fn test_initial_states_are_idle() {
        let ctx = PipelineContext::new(4);
        assert_eq!(ctx.producer_state(), TaskState::Idle);
        assert_eq!(ctx.distributor_state(), TaskState::Idle);
    }

    #[tokio::test]
    async fn test_rejection_counts_and_leaves_queue_unchanged() {
        let ctx = PipelineContext::new(1);

        let permit = ctx.reserve_slot().unwrap();
        assert!(ctx.reserve_slot().is_none());
        assert!(ctx.reserve_slot().is_none());

        let stats = ctx.stats().await;
        assert_eq!(stats.clients_rejected, 2);
        assert_eq!(stats.queued_clients, 0);
        drop(permit);
    }

    #[tokio::test]
    async fn test_admit_resumes_both_tasks() {
        let ctx = PipelineContext::new(2);
        let permit = ctx.reserve_slot().unwrap();
        let (near, _far) = tokio::io::duplex(64);
        let addr = "127.0.0.1:9000".parse().unwrap();

        ctx.admit(StreamClient::new(near, addr, permit)).await;

        assert_eq!(ctx.producer_state(), TaskState::Running);
        assert_eq!(ctx.distributor_state(), TaskState::Running);
        assert_eq!(ctx.queue().len().await, 1);

        // Wake permits were stored for both tasks
        timeout(Duration::from_millis(10), ctx.wait_producer_wake())
            .await
            .expect("producer wake stored");
        timeout(Duration::from_millis(10), ctx.wait_distributor_wake())
            .await
            .expect("distributor wake stored");

        let stats = ctx.stats().await;
        assert_eq!(stats.clients_admitted, 1);
    }
}
