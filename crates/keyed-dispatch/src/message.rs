//! # Message Envelope
//!
//! This module defines the envelope type carried on the router's and every
//! worker's mailbox. An envelope pairs the message body with an optional
//! reply channel: `Some` models a request/reply exchange, `None` models
//! fire-and-forget delivery.

use crate::error::DispatchError;
use tokio::sync::oneshot;

/// Type alias for the one-shot reply channel travelling with a request.
pub type Reply<O> = oneshot::Sender<Result<O, DispatchError>>;

/// One routed unit of work: a message body plus its reply expectation.
///
/// The envelope is consumed exactly once by the worker owning the message's
/// key. Whether the original caller expects a reply is encoded in
/// `reply_to`, mirroring a transport where a message may or may not carry a
/// reply address.
#[derive(Debug)]
pub struct Envelope<I, O> {
    pub body: I,
    pub reply_to: Option<Reply<O>>,
}

impl<I, O> Envelope<I, O> {
    /// An envelope whose outcome is delivered to `reply_to`.
    pub fn request(body: I, reply_to: Reply<O>) -> Self {
        Self {
            body,
            reply_to: Some(reply_to),
        }
    }

    /// A fire-and-forget envelope; the processing outcome is discarded.
    pub fn send(body: I) -> Self {
        Self {
            body,
            reply_to: None,
        }
    }

    /// Whether the original caller is waiting on an outcome.
    pub fn wants_reply(&self) -> bool {
        self.reply_to.is_some()
    }
}
