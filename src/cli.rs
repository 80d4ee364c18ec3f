// src/cli.rs

//! CLI argument parsing using `clap`.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_workflow_path;

/// Command-line arguments for `actionflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "actionflow",
    version,
    about = "Run declarative CI workflows as a dependency graph of actions.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workflow file (TOML). Defaults to `Workflow.toml` in the
    /// current directory.
    #[arg(long, short = 'f', value_name = "PATH")]
    pub workflow: Option<PathBuf>,

    /// Trigger event; every workflow whose `on` matches is run.
    #[arg(long, value_name = "EVENT", default_value = "push")]
    pub event: String,

    /// Maximum number of actions running at once.
    ///
    /// Overrides `[config].concurrency`.
    #[arg(long, short = 'j', value_name = "N")]
    pub concurrency: Option<NonZeroUsize>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ACTIONFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the file and print the planned waves without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn workflow_path(&self) -> PathBuf {
        self.workflow.clone().unwrap_or_else(default_workflow_path)
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
