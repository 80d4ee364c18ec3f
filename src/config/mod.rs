// src/config/mod.rs

//! Workflow definition files.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a workflow file from disk (`loader.rs`).
//! - Validate it, including the action graph (`validate.rs`).
//! - Parse duration strings used by `timeout` (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_workflow_path, load_and_validate, load_from_path, parse_and_validate};
pub use model::{
    ActionArgs, ActionConfig, ConfigSection, RawWorkflowFile, WorkflowConfig, WorkflowFile,
};
