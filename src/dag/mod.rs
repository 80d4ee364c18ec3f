// src/dag/mod.rs

//! Action graph model, construction and scheduling.
//!
//! - [`action`] holds the node types (`Action`, `Operation`, `ActionStatus`).
//! - [`graph`] is the immutable-topology graph with per-action status.
//! - [`builder`] validates declared actions and produces a [`Graph`].
//! - [`scheduler`] answers "what can run next?" as a pure query.

pub mod action;
pub mod builder;
pub mod graph;
pub mod scheduler;

pub use action::{Action, ActionId, ActionStatus, DeclaredAction, Operation, Program};
pub use builder::build;
pub use graph::Graph;
pub use scheduler::{Wave, next_wave, planned_waves};
