// src/config/model.rs

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Deserialize;

use crate::config::duration::parse_duration;
use crate::dag::{DeclaredAction, Graph, Operation, Program};
use crate::engine::default_concurrency;
use crate::errors::{ActionflowError, Result};

/// Prefix marking a container image in `uses`.
pub const DOCKER_PREFIX: &str = "docker://";

/// Raw workflow file as deserialized from TOML, before semantic validation.
///
/// ```toml
/// [config]
/// concurrency = 4
///
/// [workflow.ci]
/// on = "push"
/// resolves = ["Test"]
///
/// [action.Build]
/// run = "cargo build"
///
/// [action.Test]
/// uses = "docker://rust:1"
/// args = "cargo test"
/// needs = ["Build"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawWorkflowFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Keys are workflow names.
    #[serde(default)]
    pub workflow: BTreeMap<String, WorkflowConfig>,

    /// Keys are action names.
    #[serde(default)]
    pub action: BTreeMap<String, ActionConfig>,
}

/// Validated workflow file. Only obtainable via `TryFrom<RawWorkflowFile>`.
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    pub config: ConfigSection,
    pub workflow: BTreeMap<String, WorkflowConfig>,
    pub action: BTreeMap<String, ActionConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Maximum number of actions running at once. Defaults to the number of
    /// CPUs.
    #[serde(default)]
    pub concurrency: Option<usize>,
}

impl ConfigSection {
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(default_concurrency)
    }
}

/// `[workflow.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Event that triggers this workflow, e.g. `"push"`.
    pub on: String,

    /// Actions whose final status decides whether the workflow succeeded.
    #[serde(default)]
    pub resolves: Vec<String>,
}

/// `args` may be a single string (split on whitespace) or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ActionArgs {
    Line(String),
    List(Vec<String>),
}

impl ActionArgs {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            ActionArgs::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            ActionArgs::List(list) => list.clone(),
        }
    }
}

/// `[action.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
    /// Shell command. Mutually exclusive with `uses`.
    #[serde(default)]
    pub run: Option<String>,

    /// Container image as `docker://<image>`. Mutually exclusive with `run`.
    #[serde(default)]
    pub uses: Option<String>,

    /// Arguments passed to the container; only valid with `uses`.
    #[serde(default)]
    pub args: Option<ActionArgs>,

    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Actions that must succeed before this one runs.
    #[serde(default)]
    pub needs: Vec<String>,

    /// Duration string such as `"90s"` or `"10m"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// How many times a failed attempt is re-run.
    #[serde(default)]
    pub retries: u32,
}

impl ActionConfig {
    /// Convert into the operation descriptor handed to runners.
    pub fn to_operation(&self, name: &str) -> Result<Operation> {
        let program = match (&self.run, &self.uses) {
            (Some(cmd), None) => Program::Shell(cmd.clone()),
            (None, Some(uses)) => {
                let image = uses.strip_prefix(DOCKER_PREFIX).ok_or_else(|| {
                    ActionflowError::ConfigError(format!(
                        "action '{name}': `uses` must start with \"{DOCKER_PREFIX}\" (got \"{uses}\")"
                    ))
                })?;
                Program::Docker {
                    image: image.to_string(),
                    args: self.args.as_ref().map(ActionArgs::to_vec).unwrap_or_default(),
                }
            }
            (Some(_), Some(_)) => {
                return Err(ActionflowError::ConfigError(format!(
                    "action '{name}' sets both `run` and `uses`"
                )));
            }
            (None, None) => {
                return Err(ActionflowError::ConfigError(format!(
                    "action '{name}' must set one of `run` or `uses`"
                )));
            }
        };

        let timeout = match &self.timeout {
            Some(raw) => Some(parse_duration(raw).map_err(|e| {
                ActionflowError::ConfigError(format!("action '{name}': invalid `timeout`: {e}"))
            })?),
            None => None,
        };

        Ok(Operation {
            program,
            env: self.env.clone(),
            timeout,
            retries: self.retries,
        })
    }

    pub fn to_declared(&self, name: &str) -> Result<DeclaredAction> {
        Ok(DeclaredAction {
            name: name.to_string(),
            operation: self.to_operation(name)?,
            needs: self.needs.clone(),
        })
    }
}

impl WorkflowFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        workflow: BTreeMap<String, WorkflowConfig>,
        action: BTreeMap<String, ActionConfig>,
    ) -> Self {
        Self {
            config,
            workflow,
            action,
        }
    }

    /// Workflows whose `on` matches the given event, by name.
    pub fn workflows_for_event(&self, event: &str) -> Vec<&str> {
        self.workflow
            .iter()
            .filter(|(_, wf)| wf.on == event)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Every action of the file as declared actions.
    pub fn declared_actions(&self) -> Result<Vec<DeclaredAction>> {
        self.action
            .iter()
            .map(|(name, action)| action.to_declared(name))
            .collect()
    }

    /// Graph over every action, resolving the union of all workflows'
    /// targets. Used to validate the whole file at once.
    pub fn full_graph(&self) -> Result<Graph> {
        let resolves: BTreeSet<&String> = self
            .workflow
            .values()
            .flat_map(|wf| wf.resolves.iter())
            .collect();
        let graph = Graph::build(self.declared_actions()?, resolves.into_iter().cloned())?;
        Ok(graph)
    }

    /// Graph for one workflow: the actions reachable from its `resolves`
    /// through `needs`.
    pub fn graph_for_workflow(&self, name: &str) -> Result<Graph> {
        let wf = self.workflow.get(name).ok_or_else(|| {
            ActionflowError::ConfigError(format!("unknown workflow '{name}'"))
        })?;

        let reachable = self.reachable_from(&wf.resolves);
        let declared = self
            .action
            .iter()
            .filter(|(action, _)| reachable.contains(action.as_str()))
            .map(|(action, cfg)| cfg.to_declared(action))
            .collect::<Result<Vec<_>>>()?;

        Ok(Graph::build(declared, wf.resolves.iter().cloned())?)
    }

    fn reachable_from<'a>(&'a self, roots: &'a [String]) -> BTreeSet<&'a str> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut queue: VecDeque<&str> = roots.iter().map(String::as_str).collect();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            if let Some(action) = self.action.get(name) {
                queue.extend(action.needs.iter().map(String::as_str));
            }
        }

        seen
    }
}
