//! # Router
//!
//! The router owns the key→worker registry and is the only component that
//! ever touches it. It consumes inbound envelopes from a single mailbox, so
//! registry mutation is serialized by construction: no lock, no
//! compare-and-insert, just one logical thread of control.
//!
//! Per envelope the router extracts the routing key, locates (or lazily
//! creates) the worker bound to that key, and forwards the envelope. Worker
//! creation is the one intentional blocking point in the system: the router
//! waits for the new worker's readiness signal before forwarding, so a
//! message can never be routed to an endpoint with no registered consumer.
//! Every later message for the same key is non-blocking dispatch.
//!
//! When a reply is expected, the worker's outcome is relayed to the
//! original caller from a detached task; the router loop never waits on a
//! processing callback.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::client::RouterClient;
use crate::error::DispatchError;
use crate::failsafe::fail_safe;
use crate::message::{Envelope, Reply};
use crate::processor::Processor;
use crate::worker::WorkerHandle;

/// The uniform failure-reply contract: a fault raised while handling a
/// specific caller's message is sent back to that caller when a reply was
/// requested, and logged as an uncaught fault otherwise. Applied
/// identically at the router and worker level.
pub(crate) fn reply_or_log<O>(reply_to: Option<Reply<O>>, err: DispatchError) {
    match reply_to {
        Some(reply) => {
            let _ = reply.send(Err(err));
        }
        None => error!(error = %err, "uncaught dispatch fault"),
    }
}

/// The dispatch actor: maps inbound messages to per-key workers, creating
/// workers on demand.
///
/// # Ownership
/// The router exclusively owns the registry and the lifecycle of every
/// worker in it. A worker is created on the first message for an unseen
/// key, never replaced or duplicated, and stopped only when the router
/// shuts down.
///
/// # Usage
/// `Router::new` returns the router and its cloneable [`RouterClient`];
/// spawn `run()` on its own task and hand clones of the client to whoever
/// produces messages. The loop exits, stopping every worker, once all
/// clients are dropped.
pub struct Router<P: Processor> {
    endpoint: String,
    receiver: mpsc::UnboundedReceiver<Envelope<P::Input, P::Output>>,
    registry: HashMap<P::Key, WorkerHandle<P>>,
    processor: Arc<P>,
}

impl<P: Processor> Router<P> {
    /// Creates a router for `processor` and the client used to reach it.
    ///
    /// `endpoint` is the router's own inbound address, used as context in
    /// logs; per-worker endpoints come from [`Processor::endpoint_of`].
    pub fn new(endpoint: impl Into<String>, processor: P) -> (Self, RouterClient<P>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let router = Self {
            endpoint: endpoint.into(),
            receiver,
            registry: HashMap::new(),
            processor: Arc::new(processor),
        };
        (router, RouterClient::new(sender))
    }

    /// The router's inbound endpoint name.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Runs the router event loop, dispatching envelopes until every client
    /// is dropped, then stops all owned workers.
    pub async fn run(mut self) {
        info!(endpoint = %self.endpoint, "router started");

        while let Some(envelope) = self.receiver.recv().await {
            self.dispatch(envelope).await;
        }

        self.shutdown().await;
    }

    /// Routes one envelope: key extraction, worker lookup-or-create,
    /// forward, and (for requests) outcome relay. Every fault on this path
    /// follows [`reply_or_log`].
    async fn dispatch(&mut self, envelope: Envelope<P::Input, P::Output>) {
        let Envelope { body, reply_to } = envelope;

        let key = match self.processor.key_of(&body) {
            Ok(key) => key,
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "key extraction failed");
                reply_or_log(reply_to, DispatchError::Processing(e.to_string()));
                return;
            }
        };

        let worker = match self.worker_for(&key).await {
            Ok(worker) => worker,
            Err(e) => {
                warn!(endpoint = %self.endpoint, key = %key, error = %e, "worker unavailable");
                reply_or_log(reply_to, e);
                return;
            }
        };

        match reply_to {
            Some(caller) => {
                let (reply_tx, reply_rx) = oneshot::channel();
                let worker_endpoint = worker.endpoint().to_string();
                if let Err(e) = worker.forward(Envelope::request(body, reply_tx)) {
                    reply_or_log(Some(caller), e);
                    return;
                }
                // Relay the worker's outcome without holding up the router
                // loop; a worker that vanishes mid-request still yields a
                // failure reply.
                tokio::spawn(fail_safe(async move {
                    let outcome = match reply_rx.await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(DispatchError::ReplyDropped(worker_endpoint)),
                    };
                    let _ = caller.send(outcome);
                }));
            }
            None => {
                if let Err(e) = worker.forward(Envelope::send(body)) {
                    reply_or_log::<P::Output>(None, e);
                }
            }
        }
    }

    /// Returns the worker bound to `key`, creating and starting it if this
    /// is the first message for the key. At most one worker ever exists per
    /// key: the registry is only touched from the router's own task.
    async fn worker_for(&mut self, key: &P::Key) -> Result<&WorkerHandle<P>, DispatchError> {
        if !self.registry.contains_key(key) {
            let endpoint = self.processor.endpoint_of(key);
            debug!(endpoint = %endpoint, key = %key, "creating worker");

            // Blocks until the worker confirms its consumer is registered:
            // first-message-only latency, traded for a race-free bootstrap.
            let worker =
                WorkerHandle::spawn(key.clone(), endpoint, Arc::clone(&self.processor)).await?;
            self.registry.insert(key.clone(), worker);
            debug!(key = %key, workers = self.registry.len(), "worker registered");
        }

        match self.registry.get(key) {
            Some(worker) => Ok(worker),
            // Unreachable: inserted just above.
            None => Err(DispatchError::WorkerUnavailable(
                self.processor.endpoint_of(key),
            )),
        }
    }

    /// Stops every owned worker, each via its own stop protocol. Stop
    /// failures are logged by the handle, not escalated; shutdown is
    /// best-effort.
    async fn shutdown(mut self) {
        debug!(endpoint = %self.endpoint, workers = self.registry.len(), "stopping router");

        for (_, worker) in self.registry.drain() {
            worker.stop().await;
        }

        info!(endpoint = %self.endpoint, "router stopped");
    }
}
