//! # Per-Key Worker
//!
//! A worker is bound to exactly one routing key for its entire lifetime. It
//! owns the receiving half of a dedicated mailbox and consumes envelopes one
//! at a time, in arrival order: two messages for the same key are never
//! processed concurrently, and never reordered. A slow processing callback
//! therefore delays only its own key; every other worker keeps running.
//!
//! Lifecycle: the router spawns the worker task and blocks until the worker
//! signals that its consumer is registered (a first-message-only latency
//! cost, traded for never racing a message against worker startup). The
//! worker exits when the router closes its mailbox; the router then awaits
//! the task and logs the outcome.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::DispatchError;
use crate::failsafe::{catch_fault, fail_safe};
use crate::message::Envelope;
use crate::processor::Processor;
use crate::router::reply_or_log;

/// The router's handle to one running worker: the sending half of the
/// worker's mailbox plus the task handle used at stop time.
pub(crate) struct WorkerHandle<P: Processor> {
    key: P::Key,
    endpoint: String,
    sender: mpsc::UnboundedSender<Envelope<P::Input, P::Output>>,
    join: JoinHandle<()>,
}

impl<P: Processor> WorkerHandle<P> {
    /// Spawns a worker bound to `key` and waits until its consumer is
    /// registered before returning, so the first message cannot arrive at
    /// an endpoint nobody is listening on.
    pub(crate) async fn spawn(
        key: P::Key,
        endpoint: String,
        processor: Arc<P>,
    ) -> Result<Self, DispatchError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let worker = Worker {
            key: key.clone(),
            endpoint: endpoint.clone(),
            receiver,
            processor,
        };
        let join = tokio::spawn(fail_safe(worker.run(ready_tx)));

        match ready_rx.await {
            Ok(()) => Ok(Self {
                key,
                endpoint,
                sender,
                join,
            }),
            Err(_) => {
                warn!(endpoint = %endpoint, "worker start failed");
                Err(DispatchError::StartFailed(endpoint))
            }
        }
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Enqueues an envelope on the worker's mailbox.
    pub(crate) fn forward(
        &self,
        envelope: Envelope<P::Input, P::Output>,
    ) -> Result<(), DispatchError> {
        self.sender
            .send(envelope)
            .map_err(|_| DispatchError::WorkerUnavailable(self.endpoint.clone()))
    }

    /// Closes the mailbox and waits for the worker to drain and exit.
    /// A stop failure is logged, never escalated.
    pub(crate) async fn stop(self) {
        debug!(endpoint = %self.endpoint, key = %self.key, "stopping worker");
        drop(self.sender);
        match self.join.await {
            Ok(()) => trace!(endpoint = %self.endpoint, key = %self.key, "worker handler unregistered"),
            Err(e) => warn!(endpoint = %self.endpoint, key = %self.key, error = %e, "worker stop failed"),
        }
    }
}

/// The worker task: one key, one mailbox, one message at a time.
struct Worker<P: Processor> {
    key: P::Key,
    endpoint: String,
    receiver: mpsc::UnboundedReceiver<Envelope<P::Input, P::Output>>,
    processor: Arc<P>,
}

impl<P: Processor> Worker<P> {
    async fn run(mut self, ready: oneshot::Sender<()>) {
        debug!(endpoint = %self.endpoint, key = %self.key, "starting worker");

        // The consumer is in place once this task reaches its receive
        // loop; the router blocks on this signal before forwarding the
        // first message for the key.
        let _ = ready.send(());
        info!(endpoint = %self.endpoint, key = %self.key, "worker started");

        while let Some(envelope) = self.receiver.recv().await {
            self.handle(envelope).await;
        }

        info!(endpoint = %self.endpoint, key = %self.key, "worker stopped");
    }

    /// Processes exactly one envelope. A processing fault (error return or
    /// panic) becomes a failure reply, or a log line when no reply was
    /// requested, and never escapes to the task.
    async fn handle(&self, envelope: Envelope<P::Input, P::Output>) {
        trace!(
            endpoint = %self.endpoint,
            wants_reply = envelope.wants_reply(),
            "processing message"
        );
        let Envelope { body, reply_to } = envelope;

        // Invariant check: a message for another key reaching this mailbox
        // is a routing bug, not a recoverable condition.
        if let Ok(key) = self.processor.key_of(&body) {
            debug_assert!(key == self.key, "message routed to wrong worker");
        }

        match catch_fault(self.processor.process(body)).await {
            Ok(output) => {
                if let Some(reply) = reply_to {
                    let _ = reply.send(Ok(output));
                }
            }
            Err(e) => reply_or_log(reply_to, e),
        }
    }
}
