// src/dag/scheduler.rs

//! Wave selection.
//!
//! [`next_wave`] is a pure query over the graph: it never mutates statuses.
//! The executor applies what it returns (skips first, then dispatch) and
//! calls it again once every action of the dispatched wave has completed.

use crate::dag::action::{ActionId, ActionStatus};
use crate::dag::graph::Graph;

/// Result of one scheduler query.
///
/// Both lists are sets in meaning. They come back in declaration order only
/// so that logs are stable; consumers must not rely on it for execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wave {
    /// Pending actions whose prerequisites have all succeeded.
    pub ready: Vec<ActionId>,
    /// Pending actions that can never run because something upstream failed
    /// or was skipped. Already closed under transitivity.
    pub skipped: Vec<ActionId>,
}

impl Wave {
    /// `true` means the run has nothing left to do.
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty() && self.skipped.is_empty()
    }
}

/// Compute the next wave for the current graph state.
///
/// An action is *ready* iff it is `Pending` and every prerequisite is
/// `Succeeded`. It is *foreclosed* iff it is `Pending` and some prerequisite is
/// `Failed`, `Skipped`, or foreclosed itself. Walking the topological order
/// once reaches the fixed point, since a prerequisite is always decided before
/// its dependents.
pub fn next_wave(graph: &Graph) -> Wave {
    let mut foreclosed = vec![false; graph.len()];
    let mut wave = Wave::default();

    for &id in graph.topological_order() {
        let action = graph.action(id);
        if action.status() != ActionStatus::Pending {
            continue;
        }

        let mut blocked = false;
        let mut satisfied = true;

        for &dep in action.needs() {
            if foreclosed[dep.0] {
                blocked = true;
                break;
            }
            match graph.status(dep) {
                ActionStatus::Succeeded => {}
                ActionStatus::Failed | ActionStatus::Skipped => {
                    blocked = true;
                    break;
                }
                ActionStatus::Pending | ActionStatus::Running => satisfied = false,
            }
        }

        if blocked {
            foreclosed[id.0] = true;
            wave.skipped.push(id);
        } else if satisfied {
            wave.ready.push(id);
        }
    }

    wave.ready.sort();
    wave.skipped.sort();
    wave
}

/// Waves the graph would go through if every action succeeded.
///
/// Used for dry runs; the graph itself is left untouched.
pub fn planned_waves(graph: &Graph) -> Vec<Vec<ActionId>> {
    let mut sim = graph.clone();
    sim.reset();

    let mut waves = Vec::new();
    loop {
        let wave = next_wave(&sim);
        if wave.ready.is_empty() {
            break;
        }
        for &id in &wave.ready {
            sim.set_status(id, ActionStatus::Succeeded);
        }
        waves.push(wave.ready);
    }

    waves
}
