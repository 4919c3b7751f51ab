//! # Dispatch Errors
//!
//! This module defines the common error type used throughout the dispatch
//! layer. Centralizing the definitions keeps the failure-reply contract
//! uniform across the router, the workers, and the client.

/// Errors that can occur while routing or processing a message.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The router's mailbox is gone; no further messages can be accepted.
    #[error("router closed")]
    RouterClosed,
    /// The router went away before delivering an outcome.
    #[error("router dropped reply channel")]
    RouterDropped,
    /// A worker never confirmed readiness after being started.
    #[error("worker start failed: endpoint={0}")]
    StartFailed(String),
    /// The worker's mailbox is gone; the message could not be forwarded.
    #[error("worker unavailable: endpoint={0}")]
    WorkerUnavailable(String),
    /// The worker went away before delivering an outcome.
    #[error("worker dropped reply channel: endpoint={0}")]
    ReplyDropped(String),
    /// Key extraction or the processing callback returned an error.
    #[error("processing failed: {0}")]
    Processing(String),
    /// The processing callback panicked; the panic was contained.
    #[error("processing panicked: {0}")]
    Panicked(String),
}
