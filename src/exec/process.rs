// src/exec/process.rs

//! Process-backed action runner.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dag::Program;
use crate::engine::ActionOutcome;

use super::runner::{ActionRequest, ActionRunner};

pub const ENV_EVENT: &str = "ACTIONFLOW_EVENT";
pub const ENV_WORKFLOW: &str = "ACTIONFLOW_WORKFLOW";
pub const ENV_ACTION: &str = "ACTIONFLOW_ACTION";

/// Runs shell commands with the platform shell and container images with
/// `docker run --rm`.
///
/// - stdout lines are logged at `info`, stderr lines at `debug`.
/// - `operation.timeout` kills the process and counts as a failure.
/// - `operation.retries` re-runs a failed attempt; cancellation is never
///   retried.
/// - containers get a `--name` unique to the attempt, so a cancelled or
///   timed-out container can be killed through the daemon.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    docker_program: String,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            docker_program: "docker".to_string(),
        }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different container CLI (e.g. `podman`).
    pub fn with_docker_program(mut self, program: impl Into<String>) -> Self {
        self.docker_program = program.into();
        self
    }

    async fn execute_with_retries(
        &self,
        request: ActionRequest,
        cancel: CancellationToken,
    ) -> ActionOutcome {
        let attempts = request.operation.retries.saturating_add(1);
        let mut outcome = ActionOutcome::Failed(-1);

        for attempt in 1..=attempts {
            outcome = match self.run_once(&request, attempt, &cancel).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(
                        action = %request.name,
                        wave = request.wave,
                        error = %err,
                        "action execution error"
                    );
                    ActionOutcome::Failed(-1)
                }
            };

            match outcome {
                ActionOutcome::Failed(code) if attempt < attempts && !cancel.is_cancelled() => {
                    warn!(
                        action = %request.name,
                        attempt,
                        attempts,
                        exit_code = code,
                        "action failed; retrying"
                    );
                }
                _ => break,
            }
        }

        outcome
    }

    /// Build the command for one attempt, plus the container name when the
    /// action runs in a container.
    fn command_for(&self, request: &ActionRequest, attempt: u32) -> (Command, Option<String>) {
        let op = &request.operation;
        let context = [
            (ENV_EVENT, request.event.as_str()),
            (ENV_WORKFLOW, request.workflow.as_str()),
            (ENV_ACTION, request.name.as_str()),
        ];

        match &op.program {
            Program::Shell(line) => {
                let mut cmd = if cfg!(windows) {
                    let mut c = Command::new("cmd");
                    c.arg("/C").arg(line);
                    c
                } else {
                    let mut c = Command::new("sh");
                    c.arg("-c").arg(line);
                    c
                };
                cmd.envs(op.env.iter());
                cmd.envs(context);
                (cmd, None)
            }
            Program::Docker { image, args } => {
                let name = container_name(request, attempt);
                let mut cmd = Command::new(&self.docker_program);
                cmd.arg("run").arg("--rm").arg("--name").arg(&name);
                for (key, value) in op.env.iter() {
                    cmd.arg("-e").arg(format!("{key}={value}"));
                }
                for (key, value) in context {
                    cmd.arg("-e").arg(format!("{key}={value}"));
                }
                cmd.arg(image).args(args);
                (cmd, Some(name))
            }
        }
    }

    /// Killing the `docker run` client does not reach the container, so ask
    /// the daemon directly.
    async fn kill_container(&self, request: &ActionRequest, container: &str) {
        let status = Command::new(&self.docker_program)
            .arg("kill")
            .arg(container)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(s) if s.success() => {
                debug!(action = %request.name, container, "container killed");
            }
            Ok(s) => {
                warn!(action = %request.name, container, exit_code = ?s.code(), "docker kill failed");
            }
            Err(e) => {
                warn!(action = %request.name, container, error = %e, "could not run docker kill");
            }
        }
    }

    async fn stop(&self, request: &ActionRequest, child: &mut Child, container: Option<&str>) {
        if let Some(container) = container {
            self.kill_container(request, container).await;
        }
        if let Err(e) = child.kill().await {
            warn!(action = %request.name, error = %e, "failed to kill action process");
        }
    }

    async fn run_once(
        &self,
        request: &ActionRequest,
        attempt: u32,
        cancel: &CancellationToken,
    ) -> Result<ActionOutcome> {
        info!(
            action = %request.name,
            wave = request.wave,
            program = %request.operation.program,
            "starting action process"
        );

        let (mut cmd, container) = self.command_for(request, attempt);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for action '{}'", request.name))?;

        // Always consume both pipes so buffers don't fill.
        if let Some(stdout) = child.stdout.take() {
            let name = request.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(action = %name, "{}", line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let name = request.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(action = %name, "stderr: {}", line);
                }
            });
        }

        let timeout = request.operation.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        tokio::select! {
            status_res = child.wait() => {
                let status = status_res.with_context(|| {
                    format!("waiting for process of action '{}'", request.name)
                })?;
                let code = status.code().unwrap_or(-1);

                info!(
                    action = %request.name,
                    wave = request.wave,
                    exit_code = code,
                    success = status.success(),
                    "action process exited"
                );

                if status.success() {
                    Ok(ActionOutcome::Succeeded)
                } else {
                    Ok(ActionOutcome::Failed(code))
                }
            }

            _ = cancel.cancelled() => {
                info!(
                    action = %request.name,
                    wave = request.wave,
                    "cancellation requested; killing action process"
                );
                self.stop(request, &mut child, container.as_deref()).await;
                Ok(ActionOutcome::Cancelled)
            }

            _ = &mut deadline => {
                warn!(
                    action = %request.name,
                    wave = request.wave,
                    timeout = ?timeout,
                    "action timed out; killing process"
                );
                self.stop(request, &mut child, container.as_deref()).await;
                Ok(ActionOutcome::Failed(-1))
            }
        }
    }
}

impl ActionRunner for ProcessRunner {
    fn execute(
        &self,
        request: ActionRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ActionOutcome> + Send + '_>> {
        Box::pin(self.execute_with_retries(request, cancel))
    }
}

/// Container name for one attempt: `actionflow-<workflow>-<action>-<pid>-w<wave>-a<attempt>`,
/// with characters docker rejects replaced by `-`.
fn container_name(request: &ActionRequest, attempt: u32) -> String {
    format!(
        "actionflow-{}-{}-{}-w{}-a{}",
        sanitize(&request.workflow),
        sanitize(&request.name),
        std::process::id(),
        request.wave,
        attempt
    )
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
