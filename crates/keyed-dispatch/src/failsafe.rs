//! # Fail-Safe Wrappers
//!
//! Every asynchronous handler in the dispatch layer is wrapped so that an
//! uncaught fault inside it is logged and contained instead of escaping to
//! the runtime. An unguarded panic inside a spawned task would otherwise
//! vanish into a `JoinError` nobody inspects, or take down a task whose
//! siblings keep running against a half-dead system.
//!
//! Two adapters cover the two situations:
//!
//! - [`fail_safe`] guards a whole handler task (worker loops, reply relays,
//!   ingest handlers): a panic is logged at error severity and swallowed.
//! - [`catch_fault`] guards a single fallible invocation (the processing
//!   callback): both an `Err` return and a panic are folded into a
//!   [`DispatchError`] so they feed the uniform failure-reply contract.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::error;

use crate::error::DispatchError;

/// Adapts a handler future so a panic inside it is logged and swallowed
/// rather than propagated to the scheduler.
///
/// Apply this at every `tokio::spawn` registration point in the system.
pub async fn fail_safe<F>(fut: F)
where
    F: Future<Output = ()>,
{
    if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
        eprintln!("DBG fail_safe caught");
        error!(panic = %panic_message(&panic), "uncaught panic in handler");
    }
}

/// Runs a fallible invocation and folds both failure modes, an `Err`
/// return and a panic, into a [`DispatchError`].
pub async fn catch_fault<F, T, E>(fut: F) -> Result<T, DispatchError>
where
    F: Future<Output = Result<T, E>>,
    E: std::error::Error,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(DispatchError::Processing(e.to_string())),
        Err(panic) => { eprintln!("DBG catch_fault caught"); Err(DispatchError::Panicked(panic_message(&panic))) }
    }
}

/// Best-effort extraction of a human-readable message from a panic payload.
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(inner) = panic.downcast_ref::<Box<dyn Any + Send>>() {
        let i: &(dyn Any + Send) = &**inner;
        eprintln!("DBG inner str={:?} String={:?} innerbox={}",
            i.downcast_ref::<&str>(),
            i.downcast_ref::<String>(),
            i.downcast_ref::<Box<dyn Any + Send>>().is_some());
    }
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
