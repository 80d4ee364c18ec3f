// tests/config_loading.rs

mod common;
use crate::common::init_tracing;

use std::io::Write;
use std::time::Duration;

use actionflow::config::{load_and_validate, parse_and_validate};
use actionflow::dag::{ActionStatus, Program};
use actionflow::errors::{ActionflowError, BuildError};
use tempfile::NamedTempFile;

const CI_FILE: &str = r#"
[config]
concurrency = 3

[workflow.ci]
on = "push"
resolves = ["Test"]

[workflow.release]
on = "tag"
resolves = ["Publish"]

[action.Build]
run = "cargo build"
timeout = "10m"
retries = 2

[action.Deps]
uses = "docker://alpine:3"
args = "echo fetching deps"
env = { MODE = "ci" }

[action.Test]
run = "cargo test"
needs = ["Build", "Deps"]

[action.Publish]
uses = "docker://rust:1"
args = ["cargo", "publish", "--dry-run"]
needs = ["Test"]
"#;

fn write_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn config_error(contents: &str) -> String {
    match parse_and_validate(contents) {
        Err(ActionflowError::ConfigError(msg)) => msg,
        Err(e) => panic!("expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("expected error, got Ok"),
    }
}

fn build_error(contents: &str) -> BuildError {
    match parse_and_validate(contents) {
        Err(ActionflowError::Build(err)) => err,
        Err(e) => panic!("expected Build error, got: {e:?}"),
        Ok(_) => panic!("expected error, got Ok"),
    }
}

#[test]
fn loads_valid_file_from_disk() {
    init_tracing();

    let file = write_file(CI_FILE);
    let wf = load_and_validate(file.path()).unwrap();

    assert_eq!(wf.config.effective_concurrency(), 3);
    assert_eq!(wf.workflow.len(), 2);
    assert_eq!(wf.action.len(), 4);

    assert_eq!(wf.workflows_for_event("push"), vec!["ci"]);
    assert_eq!(wf.workflows_for_event("tag"), vec!["release"]);
    assert!(wf.workflows_for_event("schedule").is_empty());
}

#[test]
fn action_sections_become_operations() {
    let wf = parse_and_validate(CI_FILE).unwrap();

    let build = wf.action["Build"].to_operation("Build").unwrap();
    assert_eq!(build.program, Program::Shell("cargo build".to_string()));
    assert_eq!(build.timeout, Some(Duration::from_secs(600)));
    assert_eq!(build.retries, 2);

    let deps = wf.action["Deps"].to_operation("Deps").unwrap();
    assert_eq!(
        deps.program,
        Program::Docker {
            image: "alpine:3".to_string(),
            args: vec!["echo".into(), "fetching".into(), "deps".into()],
        }
    );
    assert_eq!(deps.env.get("MODE").map(String::as_str), Some("ci"));

    let publish = wf.action["Publish"].to_operation("Publish").unwrap();
    assert_eq!(
        publish.program.to_string(),
        "docker://rust:1 cargo publish --dry-run"
    );
}

#[test]
fn workflow_graph_contains_only_reachable_actions() {
    let wf = parse_and_validate(CI_FILE).unwrap();

    let ci = wf.graph_for_workflow("ci").unwrap();
    let mut names: Vec<&str> = ci.actions().map(|a| a.name()).collect();
    names.sort();
    assert_eq!(names, vec!["Build", "Deps", "Test"]);
    assert!(ci.id_of("Publish").is_none());

    let release = wf.graph_for_workflow("release").unwrap();
    assert_eq!(release.len(), 4);
    assert!(release.actions().all(|a| a.status() == ActionStatus::Pending));

    let targets: Vec<&str> = release
        .resolves()
        .iter()
        .map(|&id| release.name_of(id))
        .collect();
    assert_eq!(targets, vec!["Publish"]);
}

#[test]
fn unknown_workflow_is_a_config_error() {
    let wf = parse_and_validate(CI_FILE).unwrap();
    assert!(matches!(
        wf.graph_for_workflow("nightly"),
        Err(ActionflowError::ConfigError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Workflow.toml"));
    assert!(matches!(result, Err(ActionflowError::IoError(_))));
}

#[test]
fn malformed_toml_and_unknown_keys_are_rejected() {
    assert!(matches!(
        parse_and_validate("[workflow.ci\non = 1"),
        Err(ActionflowError::TomlError(_))
    ));

    let unknown_key = r#"
[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
run = "true"
after = ["B"]
"#;
    assert!(matches!(
        parse_and_validate(unknown_key),
        Err(ActionflowError::TomlError(_))
    ));
}

#[test]
fn file_without_workflows_is_rejected() {
    let msg = config_error(
        r#"
[action.A]
run = "true"
"#,
    );
    assert!(msg.contains("at least one"));
}

#[test]
fn zero_concurrency_is_rejected() {
    let msg = config_error(
        r#"
[config]
concurrency = 0

[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
run = "true"
"#,
    );
    assert!(msg.contains("concurrency"));
}

#[test]
fn empty_resolves_is_rejected() {
    let msg = config_error(
        r#"
[workflow.ci]
on = "push"

[action.A]
run = "true"
"#,
    );
    assert!(msg.contains("resolves"));
}

#[test]
fn run_and_uses_are_mutually_exclusive() {
    let both = config_error(
        r#"
[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
run = "true"
uses = "docker://alpine"
"#,
    );
    assert!(both.contains("both"));

    let neither = config_error(
        r#"
[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
needs = []
"#,
    );
    assert!(neither.contains("one of"));
}

#[test]
fn uses_requires_docker_prefix() {
    let msg = config_error(
        r#"
[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
uses = "alpine:3"
"#,
    );
    assert!(msg.contains("docker://"));
}

#[test]
fn args_without_uses_is_rejected() {
    let msg = config_error(
        r#"
[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
run = "true"
args = "--verbose"
"#,
    );
    assert!(msg.contains("args"));
}

#[test]
fn invalid_timeout_is_rejected() {
    let msg = config_error(
        r#"
[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
run = "true"
timeout = "5 fortnights"
"#,
    );
    assert!(msg.contains("timeout"));
}

#[test]
fn unknown_need_is_a_build_error() {
    let err = build_error(
        r#"
[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
run = "true"
needs = ["Ghost"]
"#,
    );
    assert_eq!(
        err,
        BuildError::UnknownReference {
            action: Some("A".to_string()),
            reference: "Ghost".to_string(),
        }
    );
}

#[test]
fn unknown_resolve_target_is_a_build_error() {
    let err = build_error(
        r#"
[workflow.ci]
on = "push"
resolves = ["Ghost"]

[action.A]
run = "true"
"#,
    );
    assert_eq!(
        err,
        BuildError::UnknownReference {
            action: None,
            reference: "Ghost".to_string(),
        }
    );
}

#[test]
fn cycle_anywhere_in_the_file_is_rejected() {
    // The cycle is not reachable from `resolves`, but the file is still invalid.
    let err = build_error(
        r#"
[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
run = "true"

[action.B]
run = "true"
needs = ["C"]

[action.C]
run = "true"
needs = ["B"]
"#,
    );
    match err {
        BuildError::CyclicDependency { cycle } => {
            assert_eq!(cycle.len(), 2);
            assert!(cycle.contains(&"B".to_string()));
            assert!(cycle.contains(&"C".to_string()));
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn concurrency_above_executor_limit_is_rejected() {
    let msg = config_error(
        r#"
[config]
concurrency = 9223372036854775807

[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
run = "true"
"#,
    );
    assert!(msg.contains("concurrency"));
}

#[test]
fn overflowing_timeout_is_a_config_error() {
    let msg = config_error(
        r#"
[workflow.ci]
on = "push"
resolves = ["A"]

[action.A]
run = "true"
timeout = "18446744073709551615h"
"#,
    );
    assert!(msg.contains("timeout"));
    assert!(msg.contains("too large"));
}
