#![allow(clippy::expect_used, reason = "integration tests use expect_used on deterministic fixtures")]

// crates/xenospec-cli/tests/dat_commands.rs
// ============================================================================
// Module: CLI DAT Command Tests
// Description: Integration tests for `dat build`/`dat run`.
// Purpose: Ensure a DAT folder's `build:` outputs materialize and `run:`
// steps execute and record a result summary.
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

/// Verifies `dat build` materializes every declared output file.
#[test]
fn cli_dat_build_writes_declared_outputs() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("_spec_.yaml"), "dat:\n  kind: scenario\nbuild:\n  index.yaml: generator\nrun: []\n")
        .expect("write spec");
    fs::write(dir.path().join("generator.yaml"), "briefing: survive\n").expect("write generator");

    let output = Command::new(xenospec_bin())
        .args(["dat", "build", dir.path().to_string_lossy().as_ref()])
        .output()
        .expect("dat build");

    assert!(output.status.success());
    assert!(dir.path().join("index.yaml").is_file());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Built 1"), "unexpected stdout: {stdout}");
}

/// Verifies `dat run` executes every step and writes `_result_.yaml`.
#[test]
fn cli_dat_run_writes_result_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("_spec_.yaml"), "dat:\n  kind: scenario\nbuild: {}\nrun:\n  - shell: \"true\"\n")
        .expect("write spec");

    let output = Command::new(xenospec_bin())
        .args(["dat", "run", dir.path().to_string_lossy().as_ref()])
        .output()
        .expect("dat run");

    assert!(output.status.success());
    assert!(dir.path().join("_result_.yaml").is_file());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ran 1"), "unexpected stdout: {stdout}");
}

/// Verifies `dat run` reports failure when a step's process exits non-zero.
#[test]
fn cli_dat_run_reports_step_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("_spec_.yaml"), "dat:\n  kind: scenario\nbuild: {}\nrun:\n  - shell: \"false\"\n")
        .expect("write spec");

    let output = Command::new(xenospec_bin())
        .args(["dat", "run", dir.path().to_string_lossy().as_ref()])
        .output()
        .expect("dat run");

    assert!(!output.status.success());
    assert!(dir.path().join("_result_.yaml").is_file());
}
