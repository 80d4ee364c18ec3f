// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;

use std::num::NonZeroUsize;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{WorkflowFile, load_and_validate};
use crate::dag::planned_waves;
use crate::engine::{Executor, ExecutorOptions, Run};
use crate::errors::Result;
use crate::exec::ProcessRunner;
use crate::report::{Report, RunOutcome};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - workflow file loading and validation
/// - selecting the workflows triggered by the event
/// - one `Run` per workflow, driven by the executor with a process runner
/// - Ctrl-C handling (cancels in-flight actions)
/// - printing a report per workflow
pub async fn run(args: CliArgs) -> Result<RunOutcome> {
    let file = load_and_validate(args.workflow_path())?;

    let workflows = file.workflows_for_event(&args.event);
    if workflows.is_empty() {
        warn!(event = %args.event, "no workflow is triggered by this event");
        return Ok(RunOutcome::Success);
    }

    if args.dry_run {
        print_dry_run(&file, &args.event, &workflows)?;
        return Ok(RunOutcome::Success);
    }

    let concurrency = args
        .concurrency
        .map(NonZeroUsize::get)
        .unwrap_or_else(|| file.config.effective_concurrency());

    let cancel = CancellationToken::new();

    // Ctrl-C → cancel the current run.
    {
        let token = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            warn!("interrupt received; cancelling run");
            token.cancel();
        });
    }

    let executor = Executor::new(ProcessRunner::new(), ExecutorOptions { concurrency })
        .with_cancellation(cancel.clone());

    info!(event = %args.event, ?workflows, concurrency, "triggering workflows");

    let mut overall = RunOutcome::Success;
    for name in workflows {
        let graph = file.graph_for_workflow(name)?;
        let mut run = Run::new(name, &args.event, graph);
        let report = executor.run(&mut run).await?;

        print_report(name, &report);
        overall = overall.and(report.outcome);

        if cancel.is_cancelled() {
            break;
        }
    }

    Ok(overall)
}

/// Print the final statuses of one workflow run.
fn print_report(workflow: &str, report: &Report) {
    println!("workflow {workflow}: {}", report.outcome);
    for (name, status) in report.actions.iter() {
        let marker = if report.target_status(name).is_some() {
            " (resolves)"
        } else {
            ""
        };
        println!("  {status:<9} {name}{marker}");
    }
}

/// Dry-run output: actions, dependencies and the waves they would run in.
fn print_dry_run(file: &WorkflowFile, event: &str, workflows: &[&str]) -> Result<()> {
    println!("actionflow dry-run (event = {event})");

    for &name in workflows {
        let graph = file.graph_for_workflow(name)?;
        println!();
        println!("workflow {name} ({} actions):", graph.len());

        for action in graph.actions() {
            println!("  - {}", action.name());
            println!("      program: {}", action.operation().program);
            if !action.needs().is_empty() {
                let needs: Vec<&str> = action.needs().iter().map(|&id| graph.name_of(id)).collect();
                println!("      needs: {needs:?}");
            }
        }

        for (i, wave) in planned_waves(&graph).iter().enumerate() {
            let names: Vec<&str> = wave.iter().map(|&id| graph.name_of(id)).collect();
            println!("  wave {}: {}", i + 1, names.join(", "));
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
