// crates/xenospec-cli/src/dat.rs
// ============================================================================
// Module: XenoSpec CLI DAT Commands
// Description: Drives a DAT folder's `build:` generator map and `run:` step
// list (spec.md §6).
// Purpose: Give the CLI a thin, generic executor over `_spec_.yaml` without
// hard-coding any particular "recognized bio subcommand" — those are
// external tools this engine only shells out to by name.
// Dependencies: indexmap, serde_yaml, thiserror, xenospec-core, xenospec-fetch,
// xenospec-yaml
// ============================================================================

//! ## Overview
//! A DAT folder's `_spec_.yaml` names, under `build:`, a map of output
//! filename to the specifier that generates it, and under `run:`, an ordered
//! list of steps. [`build_outputs`] resolves each generator specifier
//! through a [`FetchEngine`] rooted at the DAT's own directory and writes
//! the result as YAML; [`run_steps`] executes each step as a subprocess
//! (`dat.kind`-specific tools are expected to be on `PATH`; a recognized
//! subcommand and a `shell:` escape both ultimately run an external
//! process, they only differ in how their argument line was tokenized) and
//! writes a summary to `_result_.yaml`.

use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use serde::Serialize;
use thiserror::Error;
use xenospec_core::Specifier;
use xenospec_fetch::DatSpec;
use xenospec_fetch::DatSpecError;
use xenospec_fetch::FetchEngine;
use xenospec_fetch::FetchError;
use xenospec_fetch::RunStep;
use xenospec_yaml::load_file;
use xenospec_yaml::LoadError;
use xenospec_yaml::Node;

/// The required `_spec_.yaml` filename a DAT folder carries.
const SPEC_FILENAME: &str = "_spec_.yaml";
/// The filename a completed `run` writes its summary to.
const RESULT_FILENAME: &str = "_result_.yaml";

/// Errors raised driving a DAT folder's `build:`/`run:` sections.
#[derive(Debug, Error)]
pub enum DatCommandError {
    /// `_spec_.yaml` failed to load.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// `_spec_.yaml`'s content did not parse into a [`DatSpec`].
    #[error(transparent)]
    Parse(#[from] DatSpecError),
    /// A `build:` entry's generator specifier could not be fetched.
    #[error("failed to build `{filename}` from `{specifier}`: {source}")]
    BuildFetch {
        /// The output filename that failed.
        filename: String,
        /// The generator specifier that was fetched.
        specifier: String,
        /// Underlying fetch error.
        #[source]
        source: FetchError,
    },
    /// A generated output failed to serialize or write.
    #[error("failed to write `{path}`: {message}")]
    Write {
        /// The path that failed to write.
        path: String,
        /// A human-readable description of the failure.
        message: String,
    },
    /// A `run:` step's subprocess could not even be spawned.
    #[error("failed to spawn step {index} (`{command}`): {source}")]
    Spawn {
        /// The step's index within `run:`.
        index: usize,
        /// The command that failed to spawn.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Loads `dir`'s `_spec_.yaml` into a [`DatSpec`].
///
/// # Errors
///
/// Returns [`DatCommandError::Load`] or [`DatCommandError::Parse`].
pub fn load_spec(dir: &Path) -> Result<DatSpec, DatCommandError> {
    let node = load_file(&dir.join(SPEC_FILENAME))?;
    Ok(DatSpec::from_node(&node)?)
}

/// Resolves every `build:` entry's generator specifier through a
/// [`FetchEngine`] rooted at `dir` and writes the result as YAML to `dir`.
///
/// Returns the filenames written, in `build:`'s declared order.
///
/// # Errors
///
/// Returns [`DatCommandError::BuildFetch`] if a generator specifier cannot
/// be resolved, or [`DatCommandError::Write`] if an output cannot be
/// serialized or written.
pub fn build_outputs(dir: &Path, spec: &DatSpec) -> Result<Vec<PathBuf>, DatCommandError> {
    let fetch = FetchEngine::new(vec![dir.to_path_buf()]);
    let mut written = Vec::with_capacity(spec.build.len());
    for (filename, specifier_text) in &spec.build {
        let specifier = Specifier::parse(specifier_text.clone());
        let node = fetch
            .fetch_raw(&specifier, Some(dir))
            .map_err(|source| DatCommandError::BuildFetch {
                filename: filename.clone(),
                specifier: specifier_text.clone(),
                source,
            })?;
        let output_path = dir.join(filename);
        write_yaml(&output_path, &node)?;
        written.push(output_path);
    }
    Ok(written)
}

/// One `run:` step's outcome, recorded into `_result_.yaml`.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// The step's index within `run:`.
    pub index: usize,
    /// The command line that was executed, joined with spaces.
    pub command: String,
    /// The subprocess's exit status code, if it ran to completion.
    pub exit_code: Option<i32>,
    /// Whether the step is considered to have succeeded.
    pub success: bool,
}

/// The full summary written to `_result_.yaml` after [`run_steps`].
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// The DAT's declared kind, carried through for readability.
    pub kind: String,
    /// Every step's outcome, in execution order.
    pub steps: Vec<StepOutcome>,
    /// Whether every step succeeded.
    pub success: bool,
}

/// Executes every `run:` step as a subprocess in `dir`, stopping at the
/// first failing step, and writes a [`RunOutcome`] summary to
/// `dir/_result_.yaml`.
///
/// A recognized subcommand (`RunStep::Subcommand`) and a `shell:` escape
/// (`RunStep::Shell`) are both run as external processes; this crate has no
/// knowledge of what a "recognized bio subcommand" actually does; that
/// tooling is external to this engine.
///
/// # Errors
///
/// Returns [`DatCommandError::Spawn`] if a step's process cannot even be
/// started, or [`DatCommandError::Write`] if the result summary cannot be
/// written.
pub fn run_steps(dir: &Path, spec: &DatSpec) -> Result<RunOutcome, DatCommandError> {
    let mut steps = Vec::with_capacity(spec.run.len());
    let mut overall_success = true;

    for (index, step) in spec.run.iter().enumerate() {
        let (program, args, command_text) = match step {
            RunStep::Subcommand(program, args) => {
                let text = std::iter::once(program.clone()).chain(args.iter().cloned()).collect::<Vec<_>>().join(" ");
                (program.clone(), args.clone(), text)
            }
            RunStep::Shell(line) => ("sh".to_owned(), vec!["-c".to_owned(), line.clone()], line.clone()),
        };

        let status = Command::new(&program)
            .args(&args)
            .current_dir(dir)
            .status()
            .map_err(|source| DatCommandError::Spawn {
                index,
                command: command_text.clone(),
                source,
            })?;

        let success = status.success();
        overall_success &= success;
        steps.push(StepOutcome {
            index,
            command: command_text,
            exit_code: status.code(),
            success,
        });

        if !success {
            break;
        }
    }

    let outcome = RunOutcome {
        kind: spec.kind.clone(),
        steps,
        success: overall_success,
    };
    write_result(&dir.join(RESULT_FILENAME), &outcome)?;
    Ok(outcome)
}

/// Serializes `node` as YAML and writes it to `path`.
fn write_yaml(path: &Path, node: &Node) -> Result<(), DatCommandError> {
    let text = serde_yaml::to_string(node).map_err(|err| DatCommandError::Write {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    std::fs::write(path, text).map_err(|err| DatCommandError::Write {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

/// Serializes a [`RunOutcome`] as YAML and writes it to `path`.
fn write_result(path: &Path, outcome: &RunOutcome) -> Result<(), DatCommandError> {
    let text = serde_yaml::to_string(outcome).map_err(|err| DatCommandError::Write {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    std::fs::write(path, text).map_err(|err| DatCommandError::Write {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use std::fs;

    use super::build_outputs;
    use super::load_spec;
    use super::run_steps;

    #[test]
    fn loads_and_builds_outputs() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("_spec_.yaml"),
            "dat:\n  kind: scenario\nbuild:\n  index.yaml: generator\nrun: []\n",
        )
        .expect("write spec");
        fs::write(dir.path().join("generator.yaml"), "briefing: hi\n").expect("write generator");

        let spec = load_spec(dir.path()).expect("load spec");
        let written = build_outputs(dir.path(), &spec).expect("build outputs");
        assert_eq!(written, vec![dir.path().join("index.yaml")]);
        assert!(dir.path().join("index.yaml").exists());
    }

    #[test]
    fn runs_steps_and_writes_result() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("_spec_.yaml"),
            "dat:\n  kind: scenario\nbuild: {}\nrun:\n  - shell: \"true\"\n",
        )
        .expect("write spec");

        let spec = load_spec(dir.path()).expect("load spec");
        let outcome = run_steps(dir.path(), &spec).expect("run steps");
        assert!(outcome.success);
        assert!(dir.path().join("_result_.yaml").exists());
    }
}
