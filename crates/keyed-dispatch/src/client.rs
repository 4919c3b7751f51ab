//! # Router Client
//!
//! This module defines the client half of the router: a cheap-to-clone
//! handle that enqueues envelopes on the router's mailbox. Producers choose
//! per message whether they want the processing outcome back
//! ([`RouterClient::request`]) or not ([`RouterClient::send`]).

use tokio::sync::{mpsc, oneshot};

use crate::error::DispatchError;
use crate::message::Envelope;
use crate::processor::Processor;

/// A handle for submitting messages to a [`Router`](crate::Router).
///
/// Holds only the sending half of the router's mailbox, so cloning is
/// inexpensive and clones can be shared across tasks. The router keeps
/// running as long as at least one clone is alive.
pub struct RouterClient<P: Processor> {
    sender: mpsc::UnboundedSender<Envelope<P::Input, P::Output>>,
}

// Manual impl: a derived Clone would demand `P: Clone` for no reason.
impl<P: Processor> Clone for RouterClient<P> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<P: Processor> RouterClient<P> {
    pub(crate) fn new(sender: mpsc::UnboundedSender<Envelope<P::Input, P::Output>>) -> Self {
        Self { sender }
    }

    /// Submits a message and awaits its processing outcome.
    ///
    /// There is no timeout: if the outcome never arrives the future pends
    /// indefinitely, matching the underlying no-timeout reply contract.
    pub async fn request(&self, input: P::Input) -> Result<P::Output, DispatchError> {
        self.submit(input)?.outcome().await
    }

    /// Submits a message with a reply expectation and returns the pending
    /// outcome without awaiting it.
    ///
    /// The message is enqueued before this returns, so submission order is
    /// the arrival order the router (and therefore the per-key worker)
    /// observes; callers that must preserve ordering can enqueue
    /// synchronously and observe outcomes from elsewhere.
    pub fn submit(&self, input: P::Input) -> Result<PendingReply<P::Output>, DispatchError> {
        let (reply_to, response) = oneshot::channel();
        self.sender
            .send(Envelope::request(input, reply_to))
            .map_err(|_| DispatchError::RouterClosed)?;
        Ok(PendingReply { response })
    }

    /// Submits a message fire-and-forget; the processing outcome is
    /// discarded and a processing fault is only logged.
    pub fn send(&self, input: P::Input) -> Result<(), DispatchError> {
        self.sender
            .send(Envelope::send(input))
            .map_err(|_| DispatchError::RouterClosed)
    }
}

/// The not-yet-delivered outcome of a submitted request.
#[derive(Debug)]
pub struct PendingReply<O> {
    response: oneshot::Receiver<Result<O, DispatchError>>,
}

impl<O> PendingReply<O> {
    /// Awaits the processing outcome.
    pub async fn outcome(self) -> Result<O, DispatchError> {
        self.response
            .await
            .map_err(|_| DispatchError::RouterDropped)?
    }
}
