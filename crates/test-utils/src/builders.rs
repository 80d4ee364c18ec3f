#![allow(dead_code)]

use actionflow::dag::{DeclaredAction, Graph, Operation};
use actionflow::engine::Run;
use actionflow::errors::BuildError;

/// Builder for a list of declared actions plus resolve targets.
pub struct WorkflowBuilder {
    actions: Vec<DeclaredAction>,
    resolves: Vec<String>,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            resolves: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: DeclaredAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn resolves(mut self, name: &str) -> Self {
        self.resolves.push(name.to_string());
        self
    }

    pub fn try_build(self) -> Result<Graph, BuildError> {
        Graph::build(self.actions, self.resolves)
    }

    pub fn build(self) -> Graph {
        self.try_build()
            .expect("Failed to build valid graph from builder")
    }

    /// Build the graph and wrap it in a `Run` triggered by `push`.
    pub fn into_run(self) -> Run {
        Run::new("test", "push", self.build())
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a single `DeclaredAction`.
pub struct ActionBuilder {
    action: DeclaredAction,
}

impl ActionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            action: DeclaredAction::new(name, Operation::shell(format!("echo {name}"))),
        }
    }

    pub fn run(mut self, cmd: &str) -> Self {
        self.action.operation = Operation::shell(cmd);
        self
    }

    pub fn docker(mut self, image: &str, args: &[&str]) -> Self {
        self.action.operation =
            Operation::docker(image, args.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn needs(mut self, dep: &str) -> Self {
        self.action.needs.push(dep.to_string());
        self
    }

    pub fn build(self) -> DeclaredAction {
        self.action
    }
}

/// The three-action scenario used across tests:
/// `Build`, `Deps`, and `Test` needing both, resolving `Test`.
pub fn build_test_deps() -> WorkflowBuilder {
    WorkflowBuilder::new()
        .with_action(ActionBuilder::new("Build").build())
        .with_action(
            ActionBuilder::new("Test")
                .needs("Build")
                .needs("Deps")
                .build(),
        )
        .with_action(ActionBuilder::new("Deps").build())
        .resolves("Test")
}
