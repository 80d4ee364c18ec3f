// src/exec/runner.rs

//! Pluggable action runner abstraction.
//!
//! The executor talks to an `ActionRunner` instead of spawning processes
//! itself. Production code uses [`ProcessRunner`](super::ProcessRunner);
//! tests can provide a runner that records calls and reports canned outcomes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::dag::Operation;
use crate::engine::{ActionName, ActionOutcome};

/// Description of an action the executor wants run now.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub name: ActionName,
    pub operation: Operation,
    /// Workflow the run belongs to.
    pub workflow: String,
    /// Trigger event that started the run (e.g. `push`).
    pub event: String,
    /// Wave number within the run.
    pub wave: u64,
}

/// Capability that actually executes an action and reports pass/fail.
///
/// Implementations own retry, timeout and cancellation policy. When `cancel`
/// fires they should stop the action and return
/// [`ActionOutcome::Cancelled`].
pub trait ActionRunner: Send + Sync {
    fn execute(
        &self,
        request: ActionRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ActionOutcome> + Send + '_>>;
}

impl<R: ActionRunner + ?Sized> ActionRunner for Arc<R> {
    fn execute(
        &self,
        request: ActionRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ActionOutcome> + Send + '_>> {
        (**self).execute(request, cancel)
    }
}
