// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dag::ActionId;
use crate::errors::ExecutorError;
use crate::exec::ActionRunner;
use crate::report::Report;

use super::core::Run;
use super::{ActionOutcome, ExecutorOptions, MAX_CONCURRENCY};

/// Completion message sent back by a dispatched action task.
#[derive(Debug)]
struct Completion {
    id: ActionId,
    outcome: ActionOutcome,
}

/// Drives a [`Run`] to completion, delegating execution to an
/// [`ActionRunner`].
///
/// Every wave is dispatched concurrently (bounded by
/// [`ExecutorOptions::concurrency`]); completions come back over a single
/// channel and are all applied before the scheduler is queried again.
pub struct Executor<R: ActionRunner> {
    runner: Arc<R>,
    options: ExecutorOptions,
    cancel: CancellationToken,
}

impl<R: ActionRunner> fmt::Debug for Executor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("options", &self.options)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<R: ActionRunner + 'static> Executor<R> {
    pub fn new(runner: R, options: ExecutorOptions) -> Self {
        Self {
            runner: Arc::new(runner),
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token; cancelling it stops the run.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Main run loop.
    ///
    /// - Ask the run for the next wave (skips are applied as a side effect).
    /// - Nothing ready and nothing pending: done.
    /// - Nothing ready but something pending: [`ExecutorError::SchedulerStuck`].
    /// - Otherwise dispatch the wave and wait for all of it.
    ///
    /// Failing actions never abort the loop; they only foreclose their
    /// dependents.
    pub async fn run(&self, run: &mut Run) -> Result<Report, ExecutorError> {
        info!(
            workflow = %run.workflow(),
            event = %run.event(),
            actions = run.graph().len(),
            "run started"
        );

        loop {
            if self.cancel.is_cancelled() {
                let skipped = run.skip_pending();
                warn!(
                    workflow = %run.workflow(),
                    skipped = skipped.len(),
                    "run cancelled; remaining actions skipped"
                );
                break;
            }

            let step = run.advance();

            if step.dispatched.is_empty() {
                let pending = run.pending();
                if !pending.is_empty() {
                    error!(workflow = %run.workflow(), ?pending, "scheduler stuck");
                    return Err(ExecutorError::SchedulerStuck { pending });
                }
                break;
            }

            self.dispatch_wave(run, step.wave, step.dispatched).await;
        }

        let report = run.report();
        info!(
            workflow = %run.workflow(),
            waves = run.wave(),
            outcome = %report.outcome,
            "run finished"
        );
        Ok(report)
    }

    /// Spawn every action of the wave and block until each has reported back.
    async fn dispatch_wave(&self, run: &mut Run, wave: u64, ids: Vec<ActionId>) {
        let expected = ids.len();
        let permits = Arc::new(Semaphore::new(
            self.options.concurrency.clamp(1, MAX_CONCURRENCY),
        ));
        let (tx, mut rx) = mpsc::channel::<Completion>(expected);

        for id in ids {
            let request = run.request_for(id);
            let runner = Arc::clone(&self.runner);
            let permits = Arc::clone(&permits);
            let cancel = self.cancel.child_token();
            let tx = tx.clone();

            tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let name = request.name.clone();

                let outcome = if cancel.is_cancelled() {
                    ActionOutcome::Cancelled
                } else {
                    // Run on its own task so a panicking runner still yields
                    // a completion.
                    let handle =
                        tokio::spawn(async move { runner.execute(request, cancel).await });
                    match handle.await {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            error!(action = %name, error = %err, "action runner task failed");
                            ActionOutcome::Failed(-1)
                        }
                    }
                };

                if tx.send(Completion { id, outcome }).await.is_err() {
                    debug!(action = %name, "executor dropped completion channel");
                }
            });
        }
        drop(tx);

        // Barrier: apply every completion of this wave before returning.
        let mut received = 0;
        while received < expected {
            match rx.recv().await {
                Some(Completion { id, outcome }) => {
                    if run.complete(id, outcome) {
                        received += 1;
                    }
                }
                None => break,
            }
        }

        if received < expected {
            run.fail_running();
        }

        debug!(workflow = %run.workflow(), wave, completed = received, "wave finished");
    }
}
