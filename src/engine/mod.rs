// src/engine/mod.rs

//! Run orchestration.
//!
//! - [`core`] holds [`Run`], the synchronous state of one execution: the graph,
//!   the trigger, the wave counter. It applies scheduler decisions and
//!   completions and is fully testable without Tokio.
//! - [`runtime`] holds [`Executor`], the async shell that dispatches waves to
//!   an [`ActionRunner`](crate::exec::ActionRunner) and waits on the per-wave
//!   barrier.

/// Canonical action name type used throughout the crate.
pub type ActionName = String;

/// What an action runner reports for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Succeeded,
    /// Exit code of the process, or `-1` if it never produced one.
    Failed(i32),
    /// The runner stopped the action because the run was cancelled.
    Cancelled,
}

impl ActionOutcome {
    pub fn is_success(self) -> bool {
        self == ActionOutcome::Succeeded
    }
}

/// Largest concurrency limit the executor can honour; larger values are
/// clamped.
pub const MAX_CONCURRENCY: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Knobs for the executor.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorOptions {
    /// Upper bound on runner calls in flight at the same time.
    pub concurrency: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Number of CPUs, or 1 if that cannot be determined.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub mod core;
pub mod runtime;

pub use core::{Run, WaveStep};
pub use runtime::Executor;
