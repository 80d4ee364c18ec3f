// src/exec/mod.rs

//! Action execution layer.
//!
//! - [`runner`] defines the `ActionRunner` capability the executor is given,
//!   and the `ActionRequest` it is handed for each action.
//! - [`process`] provides `ProcessRunner`, which runs shell commands and
//!   container images with `tokio::process::Command`.

pub mod process;
pub mod runner;

pub use process::ProcessRunner;
pub use runner::{ActionRequest, ActionRunner};
