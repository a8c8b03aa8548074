// crates/xenospec-fetch/src/dat.rs
// ============================================================================
// Module: XenoSpec DAT Model
// Description: The `_spec_.yaml` schema and the DAT folder layout from
// spec.md §6.
// Purpose: Parse a DAT's build/run sections into a closed `RunStep` enum so
// the CLI and experiment runner can drive `build`/`run` without re-parsing
// ad hoc YAML shapes.
// Dependencies: indexmap, xenospec-yaml
// ============================================================================

//! ## Overview
//! A DAT ("data") folder is a self-contained unit on disk:
//! `_spec_.yaml` (required), `index.yaml` (default fetch content), and an
//! optional `_result_.yaml` written after a run. [`DatSpec::from_node`]
//! parses the required file's minimum schema.

use indexmap::IndexMap;
use xenospec_yaml::Node;

/// One step of a DAT's `run:` section: either a recognized subcommand with
/// arguments, or a `shell: ...` escape hatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStep {
    /// A recognized subcommand and its argument list.
    Subcommand(String, Vec<String>),
    /// An opaque shell command line, run verbatim by the embedding CLI.
    Shell(String),
}

/// Parsed `_spec_.yaml` content: `dat.kind`, optional `dat.path` template and
/// `dat.base`, a `build:` map, and a `run:` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatSpec {
    /// `dat.kind`: the DAT's declared category.
    pub kind: String,
    /// `dat.path`: an optional path template for where generated artifacts
    /// land, e.g. `runs/{seed}`.
    pub path_template: Option<String>,
    /// `dat.base`: an optional specifier this DAT extends/derives from.
    pub base: Option<String>,
    /// `build:` — maps an output filename to the generator specifier that
    /// produces it.
    pub build: IndexMap<String, String>,
    /// `run:` — ordered list of subcommands or shell escapes to execute.
    pub run: Vec<RunStep>,
}

/// Errors raised while parsing a `_spec_.yaml` document into a [`DatSpec`].
#[derive(Debug, thiserror::Error)]
pub enum DatSpecError {
    /// The document had no `dat:` mapping.
    #[error("`_spec_.yaml` has no `dat:` section")]
    MissingDatSection,
    /// `dat.kind` was absent or not a string.
    #[error("`_spec_.yaml`'s `dat:` section has no string `kind`")]
    MissingKind,
    /// A `build:` entry's value was not a string specifier.
    #[error("`build.{filename}` must be a string specifier")]
    InvalidBuildEntry {
        /// The offending filename key.
        filename: String,
    },
    /// A `run:` entry was neither a string nor a `{shell: ...}` mapping.
    #[error("`run[{index}]` must be a string or a `shell:` mapping")]
    InvalidRunEntry {
        /// Index of the offending entry within `run:`.
        index: usize,
    },
}

impl DatSpec {
    /// Parses a resolved `_spec_.yaml` [`Node`] into a [`DatSpec`].
    ///
    /// # Errors
    ///
    /// Returns a [`DatSpecError`] if any of the minimum required fields are
    /// missing or malformed.
    pub fn from_node(node: &Node) -> Result<Self, DatSpecError> {
        let dat = node.get("dat").ok_or(DatSpecError::MissingDatSection)?;
        let kind = dat
            .get("kind")
            .and_then(Node::as_str)
            .ok_or(DatSpecError::MissingKind)?
            .to_owned();
        let path_template = dat.get("path").and_then(Node::as_str).map(str::to_owned);
        let base = dat.get("base").and_then(Node::as_str).map(str::to_owned);

        let mut build = IndexMap::new();
        if let Some(build_node) = node.get("build") {
            if let Some(mapping) = build_node.as_mapping() {
                for (filename, target) in mapping {
                    let specifier = target
                        .as_str()
                        .ok_or_else(|| DatSpecError::InvalidBuildEntry {
                            filename: filename.clone(),
                        })?;
                    build.insert(filename.clone(), specifier.to_owned());
                }
            }
        }

        let mut run = Vec::new();
        if let Some(run_node) = node.get("run") {
            if let Some(items) = run_node.as_sequence() {
                for (index, item) in items.iter().enumerate() {
                    if let Some(text) = item.as_str() {
                        let mut parts = text.split_whitespace();
                        let command = parts
                            .next()
                            .ok_or(DatSpecError::InvalidRunEntry { index })?
                            .to_owned();
                        let args = parts.map(str::to_owned).collect();
                        run.push(RunStep::Subcommand(command, args));
                    } else if let Some(shell) = item.get("shell").and_then(Node::as_str) {
                        run.push(RunStep::Shell(shell.to_owned()));
                    } else {
                        return Err(DatSpecError::InvalidRunEntry { index });
                    }
                }
            }
        }

        Ok(Self {
            kind,
            path_template,
            base,
            build,
            run,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use xenospec_core::SourceId;
    use xenospec_yaml::load_str;

    #[test]
    fn parses_minimum_schema() {
        let node = load_str(
            "dat:\n  kind: scenario\nbuild:\n  index.yaml: generators.scenario\nrun:\n  - hydrate\n  - shell: echo hi\n",
            SourceId::from("<test>"),
        )
        .expect("load");
        let spec = DatSpec::from_node(&node).expect("parse");
        assert_eq!(spec.kind, "scenario");
        assert_eq!(spec.build["index.yaml"], "generators.scenario");
        assert_eq!(
            spec.run,
            vec![
                RunStep::Subcommand("hydrate".into(), vec![]),
                RunStep::Shell("echo hi".into()),
            ]
        );
    }

    #[test]
    fn rejects_missing_dat_section() {
        let node = load_str("build: {}\n", SourceId::from("<test>")).expect("load");
        assert!(matches!(
            DatSpec::from_node(&node),
            Err(DatSpecError::MissingDatSection)
        ));
    }
}
