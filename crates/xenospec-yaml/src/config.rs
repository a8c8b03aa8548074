// crates/xenospec-yaml/src/config.rs
// ============================================================================
// Module: XenoSpec Engine Configuration
// Description: On-disk configuration: fetch roots, global parameter
// defaults, and guard registration defaults.
// Purpose: Give the CLI and embedding programs one strict, documented config
// surface instead of scattered environment variables.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Configuration loads from a TOML file (default name `xenospec.toml`) with
//! documented defaults for everything. Missing configuration is not an
//! error: [`EngineConfig::default`] is a complete, usable configuration.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "xenospec.toml";
/// Maximum configuration file size in bytes, to fail closed on malformed or
/// hostile input before even attempting to parse it.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Default wall-clock timeout for a single session, in seconds.
const DEFAULT_WALL_CLOCK_TIMEOUT_SECS: u64 = 600;

/// Errors raised while loading [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config at {path}: {message}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },
    /// The config file exceeded [`MAX_CONFIG_FILE_SIZE`].
    #[error("config at {path} is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge {
        /// Path of the oversized file.
        path: String,
        /// Observed size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
    /// The TOML text failed to parse.
    #[error("failed to parse config at {path}: {message}")]
    Syntax {
        /// Path of the offending file.
        path: String,
        /// Parser-reported message.
        message: String,
    },
}

/// Ordered list of filesystem roots scanned for dotted-name specifiers that
/// are not satisfied by the in-memory module registry (spec.md §4.7 step 4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FetchRoots(pub Vec<PathBuf>);

impl Default for FetchRoots {
    fn default() -> Self {
        Self(vec![PathBuf::from(".")])
    }
}

impl FetchRoots {
    /// Returns the configured roots in scan order.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.0
    }
}

/// Global parameter table defaults (spec.md §6): the built-in layer of the
/// three-level precedence `xenospec-session::GlobalParams` resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamDefaults {
    /// Default per-action cost charged when a scenario does not override it.
    pub default_action_cost: f64,
    /// Default step budget for turn-based sessions.
    pub default_step_budget: u64,
    /// Default total cost budget before `BudgetExhausted` terminates a
    /// session.
    pub default_cost_budget: f64,
}

impl Default for ParamDefaults {
    fn default() -> Self {
        Self {
            default_action_cost: 1.0,
            default_step_budget: 1000,
            default_cost_budget: 1000.0,
        }
    }
}

/// Default fail mode and guard set applied when a template instantiation
/// site does not declare its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardDefaults {
    /// Guard names registered globally, unioned into every instantiation
    /// site's own guard set.
    pub global_guards: Vec<String>,
    /// Fail mode used when a guard fails and the site does not specify one:
    /// `"reject"`, `"retry"`, or `"prune"`.
    pub default_fail_mode: String,
}

impl Default for GuardDefaults {
    fn default() -> Self {
        Self {
            global_guards: Vec::new(),
            default_fail_mode: "reject".to_owned(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Filesystem roots scanned for dotted-name specifiers.
    pub fetch_roots: FetchRoots,
    /// Global parameter table defaults.
    pub params: ParamDefaults,
    /// Guard registration defaults.
    pub guards: GuardDefaults,
    /// Wall-clock timeout for a single session, in seconds. Enforced as
    /// infrastructure separate from the simulated budget (spec.md §4.8.3).
    pub wall_clock_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_roots: FetchRoots::default(),
            params: ParamDefaults::default(),
            guards: GuardDefaults::default(),
            wall_clock_timeout_secs: DEFAULT_WALL_CLOCK_TIMEOUT_SECS,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`], [`ConfigError::TooLarge`], or
    /// [`ConfigError::Syntax`] as appropriate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let metadata = fs::metadata(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if size > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::TooLarge {
                path: path.display().to_string(),
                size,
                limit: MAX_CONFIG_FILE_SIZE,
            });
        }
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        toml::from_str(&text).map_err(|err| ConfigError::Syntax {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }

    /// Loads configuration from [`DEFAULT_CONFIG_NAME`] in the given
    /// directory if it exists, otherwise returns [`EngineConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`EngineConfig::load`] when the default
    /// file exists but cannot be parsed.
    pub fn load_or_default(dir: &Path) -> Result<Self, ConfigError> {
        let candidate = dir.join(DEFAULT_CONFIG_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns a short, human-readable description of every configuration
    /// field and its default, for `xenospec-cli`'s `config doc` subcommand.
    #[must_use]
    pub fn doc_schema() -> Vec<(&'static str, &'static str)> {
        vec![
            ("fetch_roots", "ordered filesystem roots scanned for dotted specifiers, default [\".\"]"),
            ("params.default_action_cost", "default per-action cost, default 1.0"),
            ("params.default_step_budget", "default turn-based step budget, default 1000"),
            ("params.default_cost_budget", "default total cost budget, default 1000.0"),
            ("guards.global_guards", "guard names unioned into every instantiation site, default []"),
            ("guards.default_fail_mode", "reject | retry | prune, default \"reject\""),
            ("wall_clock_timeout_secs", "wall-clock session timeout in seconds, default 600"),
        ]
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;

    #[test]
    fn default_config_is_usable() {
        let config = EngineConfig::default();
        assert_eq!(config.fetch_roots.roots(), &[PathBuf::from(".")]);
        assert_eq!(config.guards.default_fail_mode, "reject");
    }

    #[test]
    fn load_or_default_falls_back_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = EngineConfig::load_or_default(dir.path()).expect("load");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn load_parses_a_written_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("xenospec.toml");
        fs::write(&path, "wall_clock_timeout_secs = 30\n").expect("write");
        let config = EngineConfig::load(&path).expect("load");
        assert_eq!(config.wall_clock_timeout_secs, 30);
    }
}
