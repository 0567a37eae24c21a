//! Concurrent frame pipeline
//!
//! The core of the crate: a producer task captures frames into one of two
//! reusable buffer slots and publishes a snapshot of the completed one; a
//! distributor task reads the snapshot under a guard and fans it out to
//! queued clients round-robin. Exactly one piece of state is shared mutably
//! between them, the published snapshot, protected by a single mutex.
//!
//! # Buffer handoff
//!
//! ```text
//!    FrameStore (producer-owned)         PipelineContext (shared)
//!   ┌──────────────────────────┐     ┌────────────────────────────┐
//!   │ slot A ──freeze──────────┼────►│ Mutex<PublishedFrame>      │
//!   │ slot B ◄──reclaim prev───┼─────│   {ptr, len} of last frame │
//!   │ write_index (round-robin)│     │ frame_ready: Notify        │
//!   └──────────────────────────┘     └────────────────────────────┘
//! ```
//!
//! A publish swaps the fresh snapshot in and hands the previous one back;
//! the producer reclaims that storage for the next write. The distributor
//! only ever reads through the guard for the duration of one
//! serialize-and-send, so no torn snapshot is ever observable.
//!
//! Both tasks carry an `Idle`/`Running` state. They start `Idle`, are
//! resumed by stream admission, and suspend themselves again when the
//! client queue drains.

pub mod context;
pub mod distributor;
pub mod producer;
pub mod queue;
pub mod store;

pub use context::{PipelineContext, PublishedFrame, TaskState};
pub use distributor::FrameDistributor;
pub use producer::FrameProducer;
pub use queue::{ClientQueue, ClientState, ClientTransport, StreamClient};
pub use store::{BufferSlot, FrameStore};
