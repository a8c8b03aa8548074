#![allow(clippy::expect_used, reason = "integration tests use expect_used on deterministic fixtures")]

// crates/xenospec-cli/tests/run_commands.rs
// ============================================================================
// Module: CLI Run Command Tests
// Description: Integration tests for `run`.
// Purpose: Ensure a scenario drives to completion against the built-in
// reference runtime and reports its termination and score.
// Dependencies: xenospec-cli binary, tempfile
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn xenospec_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_xenospec"))
}

/// Verifies `run` drives an empty-interface scenario to immediate
/// `AgentDone` termination with no script given.
#[test]
fn cli_run_ends_immediately_with_no_script() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec_path = dir.path().join("scenario.yaml");
    fs::write(
        &spec_path,
        "scenario.trial:\n  briefing: survive\n  interface:\n    actions: {}\n",
    )
    .expect("write spec");

    let output = Command::new(xenospec_bin())
        .args(["run", "--spec", spec_path.to_string_lossy().as_ref(), "--scenario", "trial", "--seed", "7"])
        .output()
        .expect("run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("AgentDone"), "unexpected stdout: {stdout}");
}

/// Verifies `run` plays back a scripted action against a seeded population
/// and reports a canonical score.
#[test]
fn cli_run_plays_back_a_script_and_scores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec_path = dir.path().join("scenario.yaml");
    fs::write(
        &spec_path,
        "scenario.trial:\n  briefing: survive\n  interface:\n    actions:\n      add_feedstock:\n        cost: 1.0\n  scoring:\n    functions:\n      total: !ev \"trace.total_cost\"\n    canonical: total\n",
    )
    .expect("write spec");

    let script_path = dir.path().join("script.json");
    fs::write(&script_path, r#"[{"name": "add_feedstock", "params": {}}]"#).expect("write script");

    let output = Command::new(xenospec_bin())
        .args([
            "run",
            "--spec",
            spec_path.to_string_lossy().as_ref(),
            "--scenario",
            "trial",
            "--script",
            script_path.to_string_lossy().as_ref(),
            "--population",
            "prey=40.0",
        ])
        .output()
        .expect("run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("score"), "unexpected stdout: {stdout}");
}

/// Verifies `run` fails closed when the named scenario does not exist.
#[test]
fn cli_run_reports_missing_scenario() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec_path = dir.path().join("scenario.yaml");
    fs::write(&spec_path, "scenario.trial:\n  interface:\n    actions: {}\n").expect("write spec");

    let output = Command::new(xenospec_bin())
        .args(["run", "--spec", spec_path.to_string_lossy().as_ref(), "--scenario", "nonexistent"])
        .output()
        .expect("run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nonexistent"), "unexpected stderr: {stderr}");
}
