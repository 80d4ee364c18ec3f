// src/dag/graph.rs

use std::collections::HashMap;

use crate::dag::action::{Action, ActionId, ActionStatus};
use crate::engine::ActionName;

/// In-memory action graph keyed by action name.
///
/// Topology (names, `needs`, dependents, resolve targets, topological order)
/// is fixed once [`build`](crate::dag::build) returns. Only the per-action
/// status changes during a run, and only through crate-internal setters used
/// by the executor.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) actions: Vec<Action>,
    pub(crate) index: HashMap<ActionName, ActionId>,
    pub(crate) resolves: Vec<ActionId>,
    /// Prerequisites always appear before their dependents.
    pub(crate) topo_order: Vec<ActionId>,
}

impl Graph {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn id_of(&self, name: &str) -> Option<ActionId> {
        self.index.get(name).copied()
    }

    /// Panics if `id` does not belong to this graph.
    pub fn action(&self, id: ActionId) -> &Action {
        &self.actions[id.0]
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.id_of(name).map(|id| self.action(id))
    }

    /// All action ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = ActionId> + '_ {
        (0..self.actions.len()).map(ActionId)
    }

    /// All actions in declaration order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn status(&self, id: ActionId) -> ActionStatus {
        self.actions[id.0].status
    }

    pub fn status_of(&self, name: &str) -> Option<ActionStatus> {
        self.get(name).map(Action::status)
    }

    pub fn name_of(&self, id: ActionId) -> &str {
        &self.actions[id.0].name
    }

    pub fn resolves(&self) -> &[ActionId] {
        &self.resolves
    }

    pub fn topological_order(&self) -> &[ActionId] {
        &self.topo_order
    }

    /// Names of actions that are still `Pending`, in declaration order.
    pub fn pending(&self) -> Vec<ActionName> {
        self.actions
            .iter()
            .filter(|a| a.status == ActionStatus::Pending)
            .map(|a| a.name.clone())
            .collect()
    }

    pub(crate) fn set_status(&mut self, id: ActionId, status: ActionStatus) -> ActionStatus {
        std::mem::replace(&mut self.actions[id.0].status, status)
    }

    /// Put every action back to `Pending`.
    pub(crate) fn reset(&mut self) {
        for action in &mut self.actions {
            action.status = ActionStatus::Pending;
        }
    }
}
