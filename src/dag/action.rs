// src/dag/action.rs

//! Action nodes and the opaque operation they carry.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::engine::ActionName;

/// What an action actually executes.
///
/// The scheduler never looks inside this; only an
/// [`ActionRunner`](crate::exec::ActionRunner) does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// A command line handed to the platform shell.
    Shell(String),
    /// A container image started with `docker run --rm`.
    Docker { image: String, args: Vec<String> },
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Program::Shell(cmd) => write!(f, "{cmd}"),
            Program::Docker { image, args } if args.is_empty() => write!(f, "docker://{image}"),
            Program::Docker { image, args } => write!(f, "docker://{image} {}", args.join(" ")),
        }
    }
}

/// Operation descriptor attached to every action.
///
/// Besides the program itself this carries runner policy (environment,
/// timeout, retries). Retrying and timing out are the runner's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub program: Program,
    pub env: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    pub retries: u32,
}

impl Operation {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            env: BTreeMap::new(),
            timeout: None,
            retries: 0,
        }
    }

    pub fn shell(cmd: impl Into<String>) -> Self {
        Self::new(Program::Shell(cmd.into()))
    }

    pub fn docker(image: impl Into<String>, args: Vec<String>) -> Self {
        Self::new(Program::Docker {
            image: image.into(),
            args,
        })
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

/// An action as supplied by a workflow definition source, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredAction {
    pub name: ActionName,
    pub operation: Operation,
    pub needs: Vec<ActionName>,
}

impl DeclaredAction {
    pub fn new(name: impl Into<ActionName>, operation: Operation) -> Self {
        Self {
            name: name.into(),
            operation,
            needs: Vec::new(),
        }
    }

    pub fn needs(mut self, dep: impl Into<ActionName>) -> Self {
        self.needs.push(dep.into());
        self
    }
}

/// Lifecycle of an action within a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// A prerequisite failed (or was itself skipped); the action never runs.
    Skipped,
}

impl ActionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ActionStatus::Succeeded | ActionStatus::Failed | ActionStatus::Skipped
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Running => "running",
            ActionStatus::Succeeded => "succeeded",
            ActionStatus::Failed => "failed",
            ActionStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Dense index of an action inside its [`Graph`](crate::dag::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(pub(crate) usize);

impl ActionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node of the graph: static topology plus the per-run status.
#[derive(Debug, Clone)]
pub struct Action {
    pub(crate) name: ActionName,
    pub(crate) operation: Operation,
    /// Prerequisites, deduplicated, in declaration order.
    pub(crate) needs: Vec<ActionId>,
    /// Actions that list this one in their `needs`.
    pub(crate) dependents: Vec<ActionId>,
    pub(crate) status: ActionStatus,
}

impl Action {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn needs(&self) -> &[ActionId] {
        &self.needs
    }

    pub fn dependents(&self) -> &[ActionId] {
        &self.dependents
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }
}
