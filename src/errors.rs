// src/errors.rs

//! Crate-wide error types.
//!
//! - [`BuildError`] is raised while turning declared actions into a graph.
//!   It is always fatal: the run never starts.
//! - [`ExecutorError`] covers invariant violations inside the run loop.
//! - [`ActionflowError`] is what the outer layers (config, CLI) return.
//!
//! Per-action failures are *not* errors; they are recorded as statuses in the
//! graph and only surface through the run report.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("duplicate action name '{0}'")]
    DuplicateName(String),

    /// `action` is `None` when the dangling name comes from `resolves`.
    #[error("{} references unknown action '{reference}'", referrer(.action))]
    UnknownReference {
        action: Option<String>,
        reference: String,
    },

    /// Names in `needs` direction; the last entry needs the first.
    #[error("cyclic dependency: {}", render_cycle(.cycle))]
    CyclicDependency { cycle: Vec<String> },
}

fn referrer(action: &Option<String>) -> String {
    match action {
        Some(name) => format!("action '{name}'"),
        None => "resolves".to_string(),
    }
}

fn render_cycle(cycle: &[String]) -> String {
    match cycle.first() {
        Some(first) => format!("{} -> {first}", cycle.join(" -> ")),
        None => "<empty>".to_string(),
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error(
        "scheduler stuck with {} pending action(s) and no eligible wave: {}",
        .pending.len(),
        .pending.join(", ")
    )]
    SchedulerStuck { pending: Vec<String> },
}

#[derive(Error, Debug)]
pub enum ActionflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ActionflowError>;
