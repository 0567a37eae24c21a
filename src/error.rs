//! Crate-level error types

use thiserror::Error;

use crate::source::SourceError;

/// Error type for server operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (bind, accept, socket configuration)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame source error (initialization or capture)
    #[error("frame source error: {0}")]
    Source(#[from] SourceError),
}

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
