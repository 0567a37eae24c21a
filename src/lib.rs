//! Multi-client MJPEG streaming over HTTP
//!
//! Streams JPEG frames captured periodically from a single source to any
//! number of concurrently connected HTTP clients, using a fixed pool of
//! exactly two frame buffers and a single guarded snapshot shared between
//! the capture side and the delivery side.
//!
//! # Architecture
//!
//! ```text
//!  FrameSource ──capture──► FrameProducer ──copy──► FrameStore (2 slots)
//!                                │
//!                                │ publish {ptr, len} under guard
//!                                ▼
//!                         PublishedFrame ◄──read── FrameDistributor
//!                                                       │
//!                                         round-robin over ClientQueue
//!                                      ┌────────────────┼──────────────┐
//!                                      ▼                ▼              ▼
//!                                  [client]         [client]       [client]
//! ```
//!
//! The producer and distributor are two long-running tasks. Each one
//! suspends itself (`Idle`) when no client is connected and is resumed by
//! the next stream admission, so the pipeline does no work when nobody is
//! watching. The distributor serves clients round-robin at `base_period / C`
//! for `C` queued clients; the rate degrades linearly with client count,
//! with no floor.
//!
//! # Example
//!
//! ```no_run
//! use mjpeg_rs::{MockSource, ServerConfig, StreamServer};
//!
//! # async fn run() -> mjpeg_rs::Result<()> {
//! let source = MockSource::new(vec![24_000]);
//! let server = StreamServer::bind(ServerConfig::default(), source).await?;
//! server.run().await
//! # }
//! ```

pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod server;
pub mod source;
pub mod stats;

pub use error::{Error, Result};
pub use server::{ServerConfig, StreamServer};
pub use source::{FrameSize, FrameSource, MockSource, SourceError};
pub use stats::ServerStats;
