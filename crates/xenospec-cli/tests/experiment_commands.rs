#![allow(clippy::expect_used, reason = "integration tests use expect_used on deterministic fixtures")]

// crates/xenospec-cli/tests/experiment_commands.rs
// ============================================================================
// Module: CLI Experiment Command Tests
// Description: Integration tests for `experiment`.
// Purpose: Ensure an experiment's axis sweep drives one run per combination
// against the built-in reference runtime.
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

/// Verifies `experiment` drives one run per Cartesian combination and
/// reports the completed count.
#[test]
fn cli_experiment_sweeps_every_combination() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec_path = dir.path().join("scenario.yaml");
    fs::write(
        &spec_path,
        "scenario.trial:\n  briefing: survive\n  interface:\n    actions: {}\n\nexperiment.sweep:\n  scenario: trial\n  axes:\n    dose: [1, 2]\n    strain: [a, b]\n  exploration: iterate\n  seed: 3\n",
    )
    .expect("write spec");

    let output = Command::new(xenospec_bin())
        .args(["experiment", "--spec", spec_path.to_string_lossy().as_ref(), "--experiment", "sweep"])
        .output()
        .expect("experiment");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("completed 4 run(s)"), "unexpected stdout: {stdout}");
}

/// Verifies `experiment` fails closed when the named experiment does not
/// exist.
#[test]
fn cli_experiment_reports_missing_experiment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec_path = dir.path().join("scenario.yaml");
    fs::write(&spec_path, "scenario.trial:\n  interface:\n    actions: {}\n").expect("write spec");

    let output = Command::new(xenospec_bin())
        .args(["experiment", "--spec", spec_path.to_string_lossy().as_ref(), "--experiment", "nonexistent"])
        .output()
        .expect("experiment");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nonexistent"), "unexpected stderr: {stderr}");
}
