//! # Keyed Dispatch
//!
//! This crate provides a sharded, actor-per-key dispatch layer: inbound
//! messages are routed by a key extracted from each message to a dedicated,
//! lazily-created worker bound exclusively to that key. Processing is
//! **serialized per key** and **unboundedly parallel across keys**: the
//! shape you want for telemetry ingestion from many independent devices,
//! where per-device ordering matters but devices never need to wait on one
//! another.
//!
//! ## Architecture Overview
//!
//! Three pieces, composed bottom-up:
//!
//! 1. **[`Processor`]**: the pluggable business logic, defining how to extract the
//!    routing key from a message, how a key's endpoint is named, and what
//!    processing a message means. Supplied once at router construction.
//! 2. **Worker** (internal): a single-consumer task bound to one key for
//!    its entire lifetime. Consumes its mailbox strictly in arrival order,
//!    one message at a time, and replies with the processing outcome (or a
//!    failure) when the caller asked for one.
//! 3. **[`Router`]**: owns the key→worker registry. On each inbound
//!    message it looks up the worker for the extracted key, creating and
//!    bootstrapping one on first contact, then forwards the message and
//!    relays the outcome. The registry is touched only from the router's
//!    own task, so "at most one worker per key" holds by construction.
//!
//! ## Concurrency Model
//!
//! - Each worker runs in its own Tokio task; messages for one key are
//!   processed sequentially with no locks, messages for distinct keys run
//!   in parallel.
//! - Worker creation is the single intentional blocking point: the router
//!   waits for the new worker's readiness signal so the first message can
//!   never race the consumer registration. Every subsequent dispatch for
//!   that key is non-blocking.
//! - Mailboxes are unbounded; the layer applies no backpressure.
//!
//! ## Failure Contract
//!
//! One rule everywhere, at both router and worker level: a fault raised
//! while handling a caller's message (key extraction failure, worker
//! start failure, processing error, processing panic) is delivered to
//! that caller as a failure reply when a reply was requested, and logged
//! as an uncaught fault otherwise. Panics inside any handler are contained
//! by the [`failsafe`] wrappers; a per-message fault never crashes the
//! process, and never kills the worker either: the next message for the
//! key is processed normally.
//!
//! ## Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use keyed_dispatch::{Processor, Router};
//!
//! #[derive(Debug)]
//! struct Sample {
//!     device: u64,
//!     value: u32,
//! }
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("sample rejected")]
//! struct SampleError;
//!
//! struct Doubler;
//!
//! #[async_trait]
//! impl Processor for Doubler {
//!     type Key = u64;
//!     type Input = Sample;
//!     type Output = u32;
//!     type Error = SampleError;
//!
//!     fn key_of(&self, input: &Sample) -> Result<u64, SampleError> {
//!         Ok(input.device)
//!     }
//!
//!     fn endpoint_of(&self, key: &u64) -> String {
//!         format!("/samples/{key:012X}/")
//!     }
//!
//!     async fn process(&self, input: Sample) -> Result<u32, SampleError> {
//!         Ok(input.value * 2)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (router, client) = Router::new("/samples/", Doubler);
//!     tokio::spawn(router.run());
//!
//!     let out = client.request(Sample { device: 7, value: 21 }).await.unwrap();
//!     assert_eq!(out, 42);
//! }
//! ```
//!
//! ## Shutdown
//!
//! Drop every [`RouterClient`] clone and the router loop exits, stopping
//! each owned worker in turn: the worker's mailbox is closed, remaining
//! messages drain, and the task is awaited. Stop failures are logged, not
//! escalated.

pub mod client;
pub mod error;
pub mod failsafe;
pub mod message;
pub mod processor;
pub mod router;
pub mod tracing;
mod worker;

// Re-export core types for convenience
pub use client::{PendingReply, RouterClient};
pub use error::DispatchError;
pub use message::{Envelope, Reply};
pub use processor::Processor;
pub use router::Router;
