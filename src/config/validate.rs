// src/config/validate.rs

use crate::config::model::{RawWorkflowFile, WorkflowFile};
use crate::dag::Program;
use crate::engine::MAX_CONCURRENCY;
use crate::errors::{ActionflowError, Result};

impl TryFrom<RawWorkflowFile> for WorkflowFile {
    type Error = ActionflowError;

    fn try_from(raw: RawWorkflowFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_file(&raw)?;
        let file = WorkflowFile::new_unchecked(raw.config, raw.workflow, raw.action);
        // Duplicates, dangling references and cycles anywhere in the file.
        file.full_graph()?;
        Ok(file)
    }
}

fn validate_raw_file(raw: &RawWorkflowFile) -> Result<()> {
    ensure_has_workflows(raw)?;
    validate_global_config(raw)?;
    validate_workflows(raw)?;
    validate_actions(raw)?;
    Ok(())
}

fn ensure_has_workflows(raw: &RawWorkflowFile) -> Result<()> {
    if raw.workflow.is_empty() {
        return Err(ActionflowError::ConfigError(
            "workflow file must contain at least one [workflow.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(raw: &RawWorkflowFile) -> Result<()> {
    match raw.config.concurrency {
        Some(0) => Err(ActionflowError::ConfigError(
            "[config].concurrency must be >= 1 (got 0)".to_string(),
        )),
        Some(n) if n > MAX_CONCURRENCY => Err(ActionflowError::ConfigError(format!(
            "[config].concurrency must be <= {MAX_CONCURRENCY} (got {n})"
        ))),
        _ => Ok(()),
    }
}

fn validate_workflows(raw: &RawWorkflowFile) -> Result<()> {
    for (name, wf) in raw.workflow.iter() {
        if wf.on.trim().is_empty() {
            return Err(ActionflowError::ConfigError(format!(
                "workflow '{name}' has an empty `on` event"
            )));
        }
        if wf.resolves.is_empty() {
            return Err(ActionflowError::ConfigError(format!(
                "workflow '{name}' must list at least one action in `resolves`"
            )));
        }
    }
    Ok(())
}

fn validate_actions(raw: &RawWorkflowFile) -> Result<()> {
    for (name, action) in raw.action.iter() {
        if action.args.is_some() && action.uses.is_none() {
            return Err(ActionflowError::ConfigError(format!(
                "action '{name}': `args` is only valid together with `uses`"
            )));
        }
        if let Some(cmd) = &action.run {
            if cmd.trim().is_empty() {
                return Err(ActionflowError::ConfigError(format!(
                    "action '{name}' has an empty `run` command"
                )));
            }
        }
        // Checks run/uses exclusivity, the docker:// prefix and `timeout`.
        let operation = action.to_operation(name)?;
        if let Program::Docker { image, .. } = &operation.program {
            if image.trim().is_empty() {
                return Err(ActionflowError::ConfigError(format!(
                    "action '{name}' has an empty image in `uses`"
                )));
            }
        }
    }
    Ok(())
}
