#![allow(clippy::expect_used, reason = "integration tests use expect_used on deterministic fixtures")]

// crates/xenospec-cli/tests/config_commands.rs
// ============================================================================
// Module: CLI Config Command Tests
// Description: Integration tests for `config doc`/`validate`/`init`.
// Purpose: Ensure config inspection and scaffolding round-trip correctly and
// fail closed on malformed input.
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

/// Verifies `config doc` lists every known field.
#[test]
fn cli_config_doc_lists_known_fields() {
    let output = Command::new(xenospec_bin()).args(["config", "doc"]).output().expect("config doc");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fetch_roots"), "unexpected stdout: {stdout}");
    assert!(stdout.contains("wall_clock_timeout_secs"), "unexpected stdout: {stdout}");
}

/// Verifies `config init` writes a file that `config validate` accepts.
#[test]
fn cli_config_init_then_validate_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("xenospec.toml");

    let init_output = Command::new(xenospec_bin())
        .args(["config", "init", "--out", config_path.to_string_lossy().as_ref()])
        .output()
        .expect("config init");
    assert!(init_output.status.success());
    assert!(config_path.is_file());

    let validate_output = Command::new(xenospec_bin())
        .args(["config", "validate", "--config", config_path.to_string_lossy().as_ref()])
        .output()
        .expect("config validate");
    assert!(validate_output.status.success());
    let stdout = String::from_utf8_lossy(&validate_output.stdout);
    assert!(stdout.contains("Config valid"), "unexpected stdout: {stdout}");
}

/// Verifies `config validate` fails closed on malformed TOML.
#[test]
fn cli_config_validate_rejects_malformed_toml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("xenospec.toml");
    fs::write(&config_path, "wall_clock_timeout_secs = \"not a number\"\n").expect("write config");

    let output = Command::new(xenospec_bin())
        .args(["config", "validate", "--config", config_path.to_string_lossy().as_ref()])
        .output()
        .expect("config validate");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load config"), "unexpected stderr: {stderr}");
}
