//! Pipeline and server counters

use crate::pipeline::TaskState;

/// Server-wide statistics snapshot
///
/// Read from the pipeline's relaxed atomic counters; values are a
/// consistent-enough view for logging and tests, not a transaction.
#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    /// Frames captured and published by the producer
    pub frames_produced: u64,
    /// Frame parts written to stream clients
    pub frames_served: u64,
    /// Single-image responses served
    pub stills_served: u64,
    /// Stream clients admitted into the queue
    pub clients_admitted: u64,
    /// Stream requests dropped because the queue was full
    pub clients_rejected: u64,
    /// Clients discarded after a disconnect or write error
    pub clients_dropped: u64,
    /// Clients currently queued
    pub queued_clients: usize,
    /// Producer task state
    pub producer_state: TaskState,
    /// Distributor task state
    pub distributor_state: TaskState,
}
