//! Error types for dispatcher operations.

use thiserror::Error;

/// Errors produced by dispatcher operations.
///
/// Every variant surfaces synchronously at the call site and is recoverable:
/// none of them leaves the dispatcher in a broken state, and a caller may
/// retry, drop the job, or stop and reconfigure as appropriate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The job buffer is at capacity; the job was not enqueued.
    #[error("job buffer full")]
    BufferFull,
    /// A dispatch loop is already running for this dispatcher.
    #[error("already running")]
    AlreadyRunning,
    /// `reset` was called while the dispatch loop is running.
    #[error("reset while dispatch in progress")]
    ResetWhileRunning,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
