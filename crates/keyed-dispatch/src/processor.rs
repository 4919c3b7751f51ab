//! # Processor Trait
//!
//! The `Processor` trait is the contract between the dispatch layer and the
//! business logic it shards. It bundles the three capabilities the router
//! needs from the application: extracting the routing key from an inbound
//! message, naming the per-key endpoint, and processing a message into an
//! output.
//!
//! # Architecture Note
//! Why a trait instead of three closures? The router, the workers, and the
//! client all need to agree on the same `Key`/`Input`/`Output`/`Error`
//! family of types. Associated types pin that family down once, and the
//! compiler rejects any mismatch: you cannot route a packet stream through
//! a processor built for a different message type.
//!
//! One `Processor` instance is shared (behind an `Arc`) by the router and
//! every worker it creates, so implementations must be `Send + Sync` and
//! keep any interior state safe for concurrent access. The `process` hook
//! itself is never invoked concurrently *for the same key*: each worker
//! awaits one invocation at a time.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// The pluggable processing capability supplied at router construction.
///
/// Implementations define how to shard the stream (`key_of`), how a shard's
/// endpoint is named (`endpoint_of`), and what processing a message means
/// (`process`).
///
/// # Async & Sharing
/// The trait is `#[async_trait]` so `process` may await (e.g. call out to
/// other services). The same instance serves every worker, which is why the
/// hooks take `&self`; per-key serialization comes from the worker's event
/// loop, not from exclusive access to the processor.
#[async_trait]
pub trait Processor: Send + Sync + 'static {
    /// The routing key extracted from a message (e.g. a device identifier).
    /// Determines which worker handles the message; stable for the lifetime
    /// of that worker.
    type Key: Eq + Hash + Clone + Debug + Display + Send + Sync + 'static;

    /// The inbound message type consumed exactly once per dispatch.
    type Input: Send + Debug + 'static;

    /// The output produced by a successful `process` invocation.
    type Output: Send + Debug + 'static;

    /// The error type for key extraction and processing faults.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Extracts the routing key from an inbound message.
    ///
    /// A failure here follows the same reply-or-log contract as a
    /// processing fault: the caller receives a failure reply if one was
    /// requested, otherwise the fault is logged.
    fn key_of(&self, input: &Self::Input) -> Result<Self::Key, Self::Error>;

    /// Derives the dedicated endpoint name for a key.
    ///
    /// The name must be unique per key and stable for the worker's
    /// lifetime; it identifies the worker in logs and failure replies.
    fn endpoint_of(&self, key: &Self::Key) -> String;

    /// Processes one message, producing an output or a fault.
    ///
    /// Runs on the owning worker's task. A slow invocation delays only
    /// messages for the same key.
    async fn process(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}
