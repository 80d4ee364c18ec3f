// src/engine/core.rs

//! Pure run state machine.
//!
//! [`Run`] owns the graph for one trigger and is the only place statuses are
//! written. It has no channels, no Tokio types, and performs no IO, so tests
//! can step a run by hand: `advance`, then `complete` each dispatched action.

use tracing::{debug, info, warn};

use crate::dag::{ActionId, ActionStatus, Graph, next_wave};
use crate::engine::{ActionName, ActionOutcome};
use crate::exec::ActionRequest;
use crate::report::{Report, summarize};

/// What a single call to [`Run::advance`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveStep {
    /// Wave number the dispatched actions belong to (0 if nothing was
    /// dispatched).
    pub wave: u64,
    /// Actions marked `Running` by this step; the caller must report a
    /// completion for each of them.
    pub dispatched: Vec<ActionId>,
    /// Actions marked `Skipped` by this step.
    pub skipped: Vec<ActionId>,
}

/// One execution of a graph for a single trigger event.
#[derive(Debug, Clone)]
pub struct Run {
    workflow: String,
    event: String,
    graph: Graph,
    wave: u64,
}

impl Run {
    pub fn new(workflow: impl Into<String>, event: impl Into<String>, graph: Graph) -> Self {
        Self {
            workflow: workflow.into(),
            event: event.into(),
            graph,
            wave: 0,
        }
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Number of waves dispatched so far.
    pub fn wave(&self) -> u64 {
        self.wave
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Query the scheduler and apply its answer: foreclosed actions become
    /// `Skipped`, ready ones become `Running` under a new wave number.
    pub fn advance(&mut self) -> WaveStep {
        let wave = next_wave(&self.graph);

        for &id in &wave.skipped {
            self.graph.set_status(id, ActionStatus::Skipped);
            info!(
                workflow = %self.workflow,
                action = %self.graph.name_of(id),
                "skipping action: a prerequisite did not succeed"
            );
        }

        if wave.ready.is_empty() {
            return WaveStep {
                wave: 0,
                dispatched: Vec::new(),
                skipped: wave.skipped,
            };
        }

        self.wave += 1;
        for &id in &wave.ready {
            self.graph.set_status(id, ActionStatus::Running);
        }

        debug!(
            workflow = %self.workflow,
            wave = self.wave,
            actions = ?wave.ready.iter().map(|&id| self.graph.name_of(id)).collect::<Vec<_>>(),
            "dispatching wave"
        );

        WaveStep {
            wave: self.wave,
            dispatched: wave.ready,
            skipped: wave.skipped,
        }
    }

    /// Record the outcome of a running action.
    ///
    /// Each action completes exactly once: a completion for an action that is
    /// not `Running` is ignored and `false` is returned. `Cancelled` is
    /// recorded as `Failed` so dependents are foreclosed.
    pub fn complete(&mut self, id: ActionId, outcome: ActionOutcome) -> bool {
        let name = self.graph.name_of(id).to_string();
        let current = self.graph.status(id);
        if current != ActionStatus::Running {
            warn!(
                workflow = %self.workflow,
                action = %name,
                status = %current,
                ?outcome,
                "ignoring completion for action that is not running"
            );
            return false;
        }

        let status = match outcome {
            ActionOutcome::Succeeded => ActionStatus::Succeeded,
            ActionOutcome::Failed(_) | ActionOutcome::Cancelled => ActionStatus::Failed,
        };
        self.graph.set_status(id, status);

        match outcome {
            ActionOutcome::Succeeded => {
                info!(workflow = %self.workflow, action = %name, "action succeeded");
            }
            ActionOutcome::Failed(code) => {
                warn!(workflow = %self.workflow, action = %name, exit_code = code, "action failed");
            }
            ActionOutcome::Cancelled => {
                warn!(workflow = %self.workflow, action = %name, "action cancelled");
            }
        }

        true
    }

    /// Mark every still-running action as failed. Used when completions can
    /// no longer arrive (e.g. the completion channel closed early).
    pub fn fail_running(&mut self) -> Vec<ActionId> {
        let running: Vec<ActionId> = self
            .graph
            .ids()
            .filter(|&id| self.graph.status(id) == ActionStatus::Running)
            .collect();

        for &id in &running {
            warn!(
                workflow = %self.workflow,
                action = %self.graph.name_of(id),
                "no completion received; marking action failed"
            );
            self.graph.set_status(id, ActionStatus::Failed);
        }

        running
    }

    /// Mark every pending action as skipped (the run was cancelled).
    pub fn skip_pending(&mut self) -> Vec<ActionId> {
        let pending: Vec<ActionId> = self
            .graph
            .ids()
            .filter(|&id| self.graph.status(id) == ActionStatus::Pending)
            .collect();

        for &id in &pending {
            self.graph.set_status(id, ActionStatus::Skipped);
        }

        pending
    }

    /// Names of actions still waiting to run.
    pub fn pending(&self) -> Vec<ActionName> {
        self.graph.pending()
    }

    /// Everything a runner needs to execute the given action.
    pub fn request_for(&self, id: ActionId) -> ActionRequest {
        let action = self.graph.action(id);
        ActionRequest {
            name: action.name().to_string(),
            operation: action.operation().clone(),
            workflow: self.workflow.clone(),
            event: self.event.clone(),
            wave: self.wave,
        }
    }

    pub fn report(&self) -> Report {
        summarize(&self.graph)
    }
}
