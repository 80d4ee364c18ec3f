// src/report.rs

//! Run reporting.
//!
//! [`summarize`] is a pure transformation over the final graph state. Turning
//! a [`Report`] into console output or an exit code is left to the caller.

use std::fmt;

use crate::dag::{ActionStatus, Graph};
use crate::engine::ActionName;

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failure,
}

impl RunOutcome {
    pub fn is_success(self) -> bool {
        self == RunOutcome::Success
    }

    /// Conventional process exit code: 0 on success, 1 otherwise.
    pub fn exit_code(self) -> i32 {
        match self {
            RunOutcome::Success => 0,
            RunOutcome::Failure => 1,
        }
    }

    /// Combine outcomes of several runs; any failure wins.
    pub fn and(self, other: RunOutcome) -> RunOutcome {
        if self.is_success() && other.is_success() {
            RunOutcome::Success
        } else {
            RunOutcome::Failure
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Success => f.write_str("success"),
            RunOutcome::Failure => f.write_str("failure"),
        }
    }
}

/// Final statuses of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Resolve targets in the order they were declared.
    pub targets: Vec<(ActionName, ActionStatus)>,
    /// Every action of the graph, in declaration order.
    pub actions: Vec<(ActionName, ActionStatus)>,
    pub outcome: RunOutcome,
}

impl Report {
    pub fn target_status(&self, name: &str) -> Option<ActionStatus> {
        lookup(&self.targets, name)
    }

    pub fn status_of(&self, name: &str) -> Option<ActionStatus> {
        lookup(&self.actions, name)
    }

    pub fn count(&self, status: ActionStatus) -> usize {
        self.actions.iter().filter(|(_, s)| *s == status).count()
    }
}

fn lookup(entries: &[(ActionName, ActionStatus)], name: &str) -> Option<ActionStatus> {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, status)| *status)
}

/// Map each resolve target to its final status.
///
/// The outcome is `Success` iff every target `Succeeded`. With no targets the
/// run is vacuously successful.
pub fn summarize(graph: &Graph) -> Report {
    let targets: Vec<(ActionName, ActionStatus)> = graph
        .resolves()
        .iter()
        .map(|&id| (graph.name_of(id).to_string(), graph.status(id)))
        .collect();

    let actions = graph
        .actions()
        .map(|a| (a.name().to_string(), a.status()))
        .collect();

    let outcome = if targets
        .iter()
        .all(|(_, status)| *status == ActionStatus::Succeeded)
    {
        RunOutcome::Success
    } else {
        RunOutcome::Failure
    };

    Report {
        targets,
        actions,
        outcome,
    }
}
