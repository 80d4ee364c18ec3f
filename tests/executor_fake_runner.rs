// tests/executor_fake_runner.rs

mod common;
use crate::common::builders::{ActionBuilder, WorkflowBuilder, build_test_deps};
use crate::common::{FakeRunner, init_tracing, with_timeout};

use std::error::Error;
use std::time::Duration;

use actionflow::dag::ActionStatus;
use actionflow::engine::{Executor, ExecutorOptions, Run};
use actionflow::report::RunOutcome;

type TestResult = Result<(), Box<dyn Error>>;

fn executor(runner: FakeRunner, concurrency: usize) -> Executor<FakeRunner> {
    Executor::new(runner, ExecutorOptions { concurrency })
}

#[tokio::test]
async fn successful_prerequisites_unlock_second_wave() -> TestResult {
    with_timeout(async {
        init_tracing();

        let runner = FakeRunner::new();
        let mut run = build_test_deps().into_run();

        let report = executor(runner.clone(), 4).run(&mut run).await?;

        assert_eq!(report.outcome, RunOutcome::Success);
        assert_eq!(report.target_status("Test"), Some(ActionStatus::Succeeded));
        assert_eq!(run.wave(), 2);

        let waves = runner.waves();
        assert_eq!(waves["Build"], 1);
        assert_eq!(waves["Deps"], 1);
        assert_eq!(waves["Test"], 2);

        let mut executed = runner.executed();
        executed.sort();
        assert_eq!(executed, vec!["Build", "Deps", "Test"]);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn failed_prerequisite_skips_target_and_fails_run() -> TestResult {
    with_timeout(async {
        init_tracing();

        let runner = FakeRunner::new().fail("Deps");
        let mut run = build_test_deps().into_run();

        let report = executor(runner.clone(), 4).run(&mut run).await?;

        assert_eq!(report.status_of("Build"), Some(ActionStatus::Succeeded));
        assert_eq!(report.status_of("Deps"), Some(ActionStatus::Failed));
        assert_eq!(report.target_status("Test"), Some(ActionStatus::Skipped));
        assert_eq!(report.outcome, RunOutcome::Failure);
        assert!(!runner.executed().contains(&"Test".to_string()));

        Ok(())
    })
    .await
}

#[tokio::test]
async fn unrelated_branches_keep_running_after_a_failure() -> TestResult {
    with_timeout(async {
        init_tracing();

        // Left:  L1 -> L2 -> L3   (L1 fails)
        // Right: R1 -> R2 -> R3
        let graph = WorkflowBuilder::new()
            .with_action(ActionBuilder::new("L1").build())
            .with_action(ActionBuilder::new("L2").needs("L1").build())
            .with_action(ActionBuilder::new("L3").needs("L2").build())
            .with_action(ActionBuilder::new("R1").build())
            .with_action(ActionBuilder::new("R2").needs("R1").build())
            .with_action(ActionBuilder::new("R3").needs("R2").build())
            .resolves("L3")
            .resolves("R3")
            .build();

        let runner = FakeRunner::new().fail("L1");
        let mut run = Run::new("ci", "push", graph);

        let report = executor(runner.clone(), 2).run(&mut run).await?;

        assert_eq!(report.status_of("L2"), Some(ActionStatus::Skipped));
        assert_eq!(report.status_of("L3"), Some(ActionStatus::Skipped));
        assert_eq!(report.status_of("R3"), Some(ActionStatus::Succeeded));
        assert_eq!(report.outcome, RunOutcome::Failure);

        let executed = runner.executed();
        assert!(executed.contains(&"R2".to_string()));
        assert!(!executed.contains(&"L2".to_string()));

        Ok(())
    })
    .await
}

#[tokio::test]
async fn failure_outside_resolve_targets_does_not_fail_run() -> TestResult {
    with_timeout(async {
        init_tracing();

        let graph = WorkflowBuilder::new()
            .with_action(ActionBuilder::new("Build").build())
            .with_action(ActionBuilder::new("Docs").build())
            .resolves("Build")
            .build();

        let runner = FakeRunner::new().fail("Docs");
        let mut run = Run::new("ci", "push", graph);

        let report = executor(runner, 2).run(&mut run).await?;

        assert_eq!(report.status_of("Docs"), Some(ActionStatus::Failed));
        assert_eq!(report.outcome, RunOutcome::Success);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn empty_graph_is_vacuously_successful() -> TestResult {
    with_timeout(async {
        init_tracing();

        let runner = FakeRunner::new();
        let mut run = WorkflowBuilder::new().into_run();

        let report = executor(runner.clone(), 1).run(&mut run).await?;

        assert_eq!(report.outcome, RunOutcome::Success);
        assert!(report.targets.is_empty());
        assert!(report.actions.is_empty());
        assert_eq!(run.wave(), 0);
        assert!(runner.executed().is_empty());

        Ok(())
    })
    .await
}

#[tokio::test]
async fn concurrency_limit_is_respected_within_a_wave() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut builder = WorkflowBuilder::new();
        for i in 0..6 {
            let name = format!("job{i}");
            builder = builder
                .with_action(ActionBuilder::new(&name).build())
                .resolves(&name);
        }
        let mut run = builder.into_run();

        let runner = FakeRunner::new().with_delay(Duration::from_millis(20));
        let report = executor(runner.clone(), 2).run(&mut run).await?;

        assert_eq!(report.outcome, RunOutcome::Success);
        assert_eq!(runner.executed().len(), 6);
        assert!(runner.peak_concurrency() <= 2, "peak was {}", runner.peak_concurrency());
        assert_eq!(run.wave(), 1);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn cancellation_fails_in_flight_and_skips_the_rest() -> TestResult {
    with_timeout(async {
        init_tracing();

        // Slow hangs until cancelled; Next depends on it.
        let graph = WorkflowBuilder::new()
            .with_action(ActionBuilder::new("Slow").build())
            .with_action(ActionBuilder::new("Fast").build())
            .with_action(ActionBuilder::new("Next").needs("Slow").build())
            .with_action(ActionBuilder::new("AfterFast").needs("Fast").build())
            .resolves("Next")
            .build();

        let runner = FakeRunner::new().hang("Slow");
        let exec = executor(runner.clone(), 4);
        let token = exec.cancellation_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let mut run = Run::new("ci", "push", graph);
        let report = exec.run(&mut run).await?;

        assert_eq!(report.status_of("Slow"), Some(ActionStatus::Failed));
        assert_eq!(report.status_of("Fast"), Some(ActionStatus::Succeeded));
        assert_eq!(report.status_of("Next"), Some(ActionStatus::Skipped));
        // Eligible, but the run was cancelled before the next wave.
        assert_eq!(report.status_of("AfterFast"), Some(ActionStatus::Skipped));
        assert_eq!(report.outcome, RunOutcome::Failure);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn panicking_runner_marks_action_failed() -> TestResult {
    with_timeout(async {
        init_tracing();

        let runner = FakeRunner::new().panic_on("Build");
        let mut run = build_test_deps().into_run();

        let report = executor(runner, 2).run(&mut run).await?;

        assert_eq!(report.status_of("Build"), Some(ActionStatus::Failed));
        assert_eq!(report.status_of("Deps"), Some(ActionStatus::Succeeded));
        assert_eq!(report.target_status("Test"), Some(ActionStatus::Skipped));
        assert_eq!(report.outcome, RunOutcome::Failure);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn oversized_concurrency_limit_is_clamped() -> TestResult {
    with_timeout(async {
        init_tracing();

        let runner = FakeRunner::new();
        let mut run = build_test_deps().into_run();

        let report = executor(runner.clone(), usize::MAX).run(&mut run).await?;

        assert_eq!(report.outcome, RunOutcome::Success);
        assert_eq!(runner.executed().len(), 3);

        Ok(())
    })
    .await
}
