// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawWorkflowFile, WorkflowFile};
use crate::errors::Result;

/// Load a workflow file from a given path and return the raw `RawWorkflowFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (graph correctness, etc.). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflowFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawWorkflowFile = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a workflow file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks action definitions, workflows, and the action graph as a whole
///   (duplicates, unknown `needs`/`resolves`, cycles).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkflowFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let file = WorkflowFile::try_from(raw)?;
    debug!(
        path = %path.display(),
        workflows = file.workflow.len(),
        actions = file.action.len(),
        "loaded workflow file"
    );
    Ok(file)
}

/// Same as [`load_and_validate`] but from an in-memory string.
pub fn parse_and_validate(contents: &str) -> Result<WorkflowFile> {
    let raw: RawWorkflowFile = toml::from_str(contents)?;
    WorkflowFile::try_from(raw)
}

/// Default workflow file: `Workflow.toml` in the current working directory.
pub fn default_workflow_path() -> PathBuf {
    PathBuf::from("Workflow.toml")
}
