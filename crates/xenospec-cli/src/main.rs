#![cfg_attr(
    test,
    allow(
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
    )
)]
// crates/xenospec-cli/src/main.rs
// ============================================================================
// Module: XenoSpec CLI Entry Point
// Description: Command dispatcher driving the spec engine pipeline, single
// sessions, experiment sweeps, and DAT folder workflows.
// Purpose: The one place this workspace supplies concrete Simulator/Agent
// implementations and wires every library crate into operator-facing
// subcommands.
// Dependencies: clap, serde_json, thiserror, toml, xenospec-core,
// xenospec-experiment, xenospec-hydrate, xenospec-session, xenospec-template,
// xenospec-yaml.
// ============================================================================

//! ## Overview
//! `xenospec` exposes `build`/`validate` (run the pipeline and report what
//! was hydrated), `config` (inspect or scaffold `xenospec.toml`), `run`
//! (drive one scenario to completion against the built-in reference
//! runtime), `experiment` (sweep an experiment's axes against the same
//! runtime), and `dat` (drive a DAT folder's `build:`/`run:` sections).
//! All user-facing strings are routed through the i18n catalog to prepare
//! for future localization.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use xenospec_cli::dat;
use xenospec_cli::pipeline::Pipeline;
use xenospec_cli::runtime::NullSimulator;
use xenospec_cli::runtime::ScriptedAgent;
use xenospec_cli::t;
use xenospec_experiment::ExperimentSpec;
use xenospec_session::Scenario;
use xenospec_session::Session;
use xenospec_yaml::EngineConfig;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "xenospec",
    disable_help_subcommand = true,
    disable_version_flag = true,
    arg_required_else_help = true
)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a spec file through load/resolve/scope/hydrate and report what
    /// was hydrated.
    Build(BuildCommand),
    /// Run a spec file through the pipeline and report only success/failure.
    Validate(ValidateCommand),
    /// Engine configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Drive one scenario to completion against the built-in reference
    /// runtime.
    Run(RunCommand),
    /// Sweep an experiment's axes against the built-in reference runtime.
    Experiment(ExperimentCommand),
    /// DAT folder workflows.
    Dat {
        /// Selected DAT subcommand.
        #[command(subcommand)]
        command: DatCommand,
    },
}

/// Arguments shared by `build` and `validate`: where to find the spec and
/// any extra fetch roots.
#[derive(Args, Debug, Clone)]
struct PipelineArgs {
    /// Path to the root spec YAML file.
    #[arg(long, value_name = "PATH")]
    spec: PathBuf,
    /// Additional filesystem roots consulted for dotted-name specifiers.
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,
}

/// Arguments for the `build` command.
#[derive(Args, Debug)]
struct BuildCommand {
    #[command(flatten)]
    pipeline: PipelineArgs,
    /// Expand one entity's body through the template expander and print the
    /// result as YAML, in addition to the hydration summary.
    #[arg(long, value_name = "DOTTED_NAME")]
    expand: Option<String>,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
struct ValidateCommand {
    #[command(flatten)]
    pipeline: PipelineArgs,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print every configuration field and its default.
    Doc,
    /// Parse a config file and report success/failure.
    Validate(ConfigValidateCommand),
    /// Write a default `xenospec.toml`.
    Init(ConfigInitCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Path to the config file to validate.
    #[arg(long, value_name = "PATH")]
    config: PathBuf,
}

/// Arguments for `config init`.
#[derive(Args, Debug)]
struct ConfigInitCommand {
    /// Output path for the default config (defaults to `xenospec.toml`).
    #[arg(long, value_name = "PATH", default_value = "xenospec.toml")]
    out: PathBuf,
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
struct RunCommand {
    #[command(flatten)]
    pipeline: PipelineArgs,
    /// Dotted name of the `scenario` entity to run.
    #[arg(long, value_name = "DOTTED_NAME")]
    scenario: String,
    /// Seed to drive the session with.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Path to a JSON file containing an ordered list of scripted actions
    /// for the reference agent to play back; if omitted, the agent ends the
    /// episode immediately on its first decision.
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,
    /// Initial simulator populations as `name=value` pairs.
    #[arg(long = "population", value_name = "NAME=VALUE")]
    populations: Vec<String>,
}

/// Arguments for the `experiment` command.
#[derive(Args, Debug)]
struct ExperimentCommand {
    #[command(flatten)]
    pipeline: PipelineArgs,
    /// Dotted name of the `experiment` entity to sweep.
    #[arg(long, value_name = "DOTTED_NAME")]
    experiment: String,
    /// Path to a JSON file containing an ordered list of scripted actions
    /// for the reference agent to play back on every run.
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,
    /// Initial simulator populations as `name=value` pairs, applied to every
    /// run.
    #[arg(long = "population", value_name = "NAME=VALUE")]
    populations: Vec<String>,
}

/// DAT subcommands.
#[derive(Subcommand, Debug)]
enum DatCommand {
    /// Resolve a DAT folder's `build:` generator map and write its outputs.
    Build(DatDirCommand),
    /// Execute a DAT folder's `run:` step list.
    Run(DatDirCommand),
}

/// Arguments shared by `dat build` and `dat run`.
#[derive(Args, Debug)]
struct DatDirCommand {
    /// The DAT folder, containing `_spec_.yaml`.
    #[arg(value_name = "DIR")]
    dir: PathBuf,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self { message }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Commands::Build(command) => command_build(&command),
        Commands::Validate(command) => command_validate(&command),
        Commands::Config { command } => command_config(command),
        Commands::Run(command) => command_run(&command),
        Commands::Experiment(command) => command_experiment(&command),
        Commands::Dat { command } => command_dat(command),
    }
}

// ============================================================================
// SECTION: Build / Validate Commands
// ============================================================================

/// Executes the `build` command.
fn command_build(command: &BuildCommand) -> CliResult<ExitCode> {
    let pipeline = build_pipeline(&command.pipeline)?;

    write_stdout_line(&t!("build.summary.header", count = pipeline.summary().len()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    for (name, type_tag) in pipeline.summary() {
        write_stdout_line(&t!("build.summary.row", name = name, type_tag = type_tag))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }

    if let Some(name) = &command.expand {
        let entity = pipeline
            .require(name)
            .map_err(|err| CliError::new(t!("build.expand_failed", name = name, error = err)))?;
        let expanded = pipeline
            .expand_entity(entity, 0)
            .map_err(|err| CliError::new(t!("build.expand_failed", name = name, error = err)))?;
        let yaml = serde_yaml::to_string(expanded.body())
            .map_err(|err| CliError::new(t!("build.expand_failed", name = name, error = err)))?;
        write_stdout_line(&t!("build.expand.header", name = name))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        write_stdout_line(&yaml).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    match Pipeline::build(&command.pipeline.spec, &command.pipeline.roots) {
        Ok(_) => {
            write_stdout_line(&t!("validate.ok", path = command.pipeline.spec.display()))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            write_stderr_line(&t!("validate.failed", path = command.pipeline.spec.display(), error = err))
                .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Runs a spec file through the pipeline, reporting a localized error on
/// failure.
fn build_pipeline(args: &PipelineArgs) -> CliResult<Pipeline> {
    Pipeline::build(&args.spec, &args.roots)
        .map_err(|err| CliError::new(t!("pipeline.build_failed", path = args.spec.display(), error = err)))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Doc => command_config_doc(),
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Init(command) => command_config_init(&command),
    }
}

/// Prints every configuration field and its default.
fn command_config_doc() -> CliResult<ExitCode> {
    write_stdout_line(&t!("config.doc.header")).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    for (field, description) in EngineConfig::doc_schema() {
        write_stdout_line(&format!("  {field}: {description}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Parses a config file and reports success/failure.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    match EngineConfig::load(&command.config) {
        Ok(_) => {
            write_stdout_line(&t!("config.validate.ok", path = command.config.display()))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            write_stderr_line(&t!("config.load_failed", path = command.config.display(), error = err))
                .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Writes a default `xenospec.toml`.
fn command_config_init(command: &ConfigInitCommand) -> CliResult<ExitCode> {
    let config = EngineConfig::default();
    let text = toml::to_string_pretty(&config)
        .map_err(|err| CliError::new(t!("config.init.serialize_failed", error = err)))?;
    std::fs::write(&command.out, text)
        .map_err(|err| CliError::new(t!("config.init.write_failed", path = command.out.display(), error = err)))?;
    write_stdout_line(&t!("config.init.ok", path = command.out.display()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let pipeline = build_pipeline(&command.pipeline)?;
    let entity = pipeline
        .require(&command.scenario)
        .map_err(|err| CliError::new(t!("run.scenario_not_found", name = command.scenario, error = err)))?;
    let expanded = pipeline
        .expand_entity(entity, command.seed)
        .map_err(|err| CliError::new(t!("run.session_failed", error = err)))?;
    let scenario =
        Scenario::from_entity(&expanded).map_err(|err| CliError::new(t!("run.session_failed", error = err)))?;

    let populations = parse_populations(&command.populations);
    let simulator = NullSimulator::with_populations(populations);
    let mut agent = load_agent(command.script.as_deref())?;

    let mut session = Session::new(scenario, simulator, command.seed);
    let score = session
        .run_to_completion(&mut agent)
        .map_err(|err| CliError::new(t!("run.session_failed", error = err)))?;

    let reason = session
        .termination_reason()
        .map(|reason| format!("{reason:?}"))
        .unwrap_or_else(|| "unterminated".to_owned());
    write_stdout_line(&t!("run.outcome.header", name = command.scenario, reason = reason))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    if let Some(report) = score {
        if let Some(canonical) = report.canonical_score {
            write_stdout_line(&t!("run.outcome.score", score = canonical))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
        for (name, value) in &report.scores {
            write_stdout_line(&format!("  {name}: {value}"))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Builds the reference agent for `run`/`experiment`, from a scripted step
/// file if given, or an empty script otherwise.
fn load_agent(script: Option<&Path>) -> CliResult<ScriptedAgent> {
    match script {
        Some(path) => ScriptedAgent::load(path)
            .map_err(|err| CliError::new(t!("run.script_failed", path = path.display(), error = err))),
        None => Ok(ScriptedAgent::empty()),
    }
}

/// Parses `name=value` population arguments into a lookup table.
fn parse_populations(entries: &[String]) -> HashMap<String, f64> {
    let mut populations = HashMap::with_capacity(entries.len());
    for entry in entries {
        if let Some((name, value)) = entry.split_once('=') {
            if let Ok(parsed) = value.parse::<f64>() {
                populations.insert(name.to_owned(), parsed);
            }
        }
    }
    populations
}

// ============================================================================
// SECTION: Experiment Command
// ============================================================================

/// Executes the `experiment` command.
fn command_experiment(command: &ExperimentCommand) -> CliResult<ExitCode> {
    let pipeline = build_pipeline(&command.pipeline)?;
    let entity = pipeline
        .require(&command.experiment)
        .map_err(|err| CliError::new(t!("experiment.not_found", name = command.experiment, error = err)))?;
    // The experiment entity's own body has no seed of its own yet to expand
    // with (its `seed` field is itself read out of that body), so it is
    // expanded structurally with a fixed seed of 0; only the scenario it
    // references is expanded per-experiment-seed below.
    let expanded_experiment = pipeline
        .expand_entity(entity, 0)
        .map_err(|err| CliError::new(t!("experiment.run_failed", name = command.experiment, error = err)))?;
    let spec = ExperimentSpec::from_entity(&expanded_experiment)
        .map_err(|err| CliError::new(t!("experiment.run_failed", name = command.experiment, error = err)))?;

    let scenario_entity = pipeline
        .require(&spec.scenario_ref)
        .map_err(|err| CliError::new(t!("run.scenario_not_found", name = spec.scenario_ref, error = err)))?;
    let expanded_scenario = pipeline
        .expand_entity(scenario_entity, spec.seed)
        .map_err(|err| CliError::new(t!("experiment.run_failed", name = command.experiment, error = err)))?;
    let scenario = Scenario::from_entity(&expanded_scenario)
        .map_err(|err| CliError::new(t!("experiment.run_failed", name = command.experiment, error = err)))?;

    let populations = parse_populations(&command.populations);
    let script = command.script.clone();

    let outcome = xenospec_experiment::run(&spec, &scenario, |_combination, _seed| {
        let simulator = NullSimulator::with_populations(populations.clone());
        let agent = script
            .as_deref()
            .and_then(|path| ScriptedAgent::load(path).ok())
            .unwrap_or_else(ScriptedAgent::empty);
        (simulator, agent)
    })
    .map_err(|err| CliError::new(t!("experiment.run_failed", name = command.experiment, error = err)))?;

    write_stdout_line(&t!("experiment.outcome.header", name = command.experiment, count = outcome.records.len()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    for record in &outcome.records {
        write_stdout_line(&format!(
            "  seed={} success={} canonical_score={:?}",
            record.seed, record.success, record.canonical_score
        ))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    for diagnostic in &outcome.diagnostics {
        write_stderr_line(diagnostic).map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: DAT Commands
// ============================================================================

/// Dispatches DAT subcommands.
fn command_dat(command: DatCommand) -> CliResult<ExitCode> {
    match command {
        DatCommand::Build(command) => command_dat_build(&command),
        DatCommand::Run(command) => command_dat_run(&command),
    }
}

/// Executes `dat build`.
fn command_dat_build(command: &DatDirCommand) -> CliResult<ExitCode> {
    let spec = dat::load_spec(&command.dir)
        .map_err(|err| CliError::new(t!("dat.spec_load_failed", path = command.dir.display(), error = err)))?;
    let written = dat::build_outputs(&command.dir, &spec)
        .map_err(|err| CliError::new(t!("dat.build_failed", path = command.dir.display(), error = err)))?;
    write_stdout_line(&t!("dat.build.ok", count = written.len(), path = command.dir.display()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `dat run`.
fn command_dat_run(command: &DatDirCommand) -> CliResult<ExitCode> {
    let spec = dat::load_spec(&command.dir)
        .map_err(|err| CliError::new(t!("dat.spec_load_failed", path = command.dir.display(), error = err)))?;
    let outcome = dat::run_steps(&command.dir, &spec)
        .map_err(|err| CliError::new(t!("dat.run_failed", path = command.dir.display(), error = err)))?;

    if outcome.success {
        write_stdout_line(&t!("dat.run.ok", count = outcome.steps.len(), path = command.dir.display()))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        Ok(ExitCode::SUCCESS)
    } else {
        write_stderr_line(&t!("dat.run.incomplete", path = command.dir.display()))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
        Ok(ExitCode::FAILURE)
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::parse_populations;

    #[test]
    fn parse_populations_ignores_malformed_entries() {
        let parsed = parse_populations(&["prey=40.0".to_owned(), "malformed".to_owned(), "predator=abc".to_owned()]);
        assert_eq!(parsed.get("prey"), Some(&40.0));
        assert_eq!(parsed.get("predator"), None);
        assert_eq!(parsed.len(), 1);
    }
}
