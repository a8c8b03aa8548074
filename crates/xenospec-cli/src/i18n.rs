// crates/xenospec-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for future localization support.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The XenoSpec CLI stores user-facing strings in a small translation
//! catalog to enforce consistent messaging and to prepare for future locales.
//! All runtime output should be routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself to avoid panics.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries loaded into the localized message bundle.
const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "xenospec {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("pipeline.build_failed", "Failed to build {path}: {error}"),
    ("build.summary.header", "Hydrated {count} entit(y/ies):"),
    ("build.summary.row", "  {name} ({type_tag})"),
    ("build.expand_failed", "Failed to expand {name}: {error}"),
    ("build.expand.header", "Expanded {name}:"),
    ("validate.ok", "{path} is valid."),
    ("validate.failed", "{path} is invalid: {error}"),
    ("config.load_failed", "Failed to load config at {path}: {error}"),
    ("config.validate.ok", "Config valid: {path}"),
    ("config.init.write_failed", "Failed to write default config to {path}: {error}"),
    ("config.init.serialize_failed", "Failed to serialize default config: {error}"),
    ("config.init.ok", "Default config written to {path}"),
    ("config.doc.header", "XenoSpec engine configuration schema:"),
    ("run.scenario_not_found", "Scenario {name} was not found: {error}"),
    ("run.script_failed", "Failed to load script at {path}: {error}"),
    ("run.session_failed", "Session failed: {error}"),
    ("run.outcome.header", "Session for {name} ended: {reason}"),
    ("run.outcome.score", "  score: {score}"),
    ("experiment.not_found", "Experiment {name} was not found: {error}"),
    ("experiment.run_failed", "Experiment {name} failed: {error}"),
    ("experiment.outcome.header", "Experiment {name} completed {count} run(s)."),
    ("dat.spec_load_failed", "Failed to load {path}/_spec_.yaml: {error}"),
    ("dat.build_failed", "DAT build failed in {path}: {error}"),
    ("dat.build.ok", "Built {count} output(s) in {path}."),
    ("dat.run_failed", "DAT run failed in {path}: {error}"),
    ("dat.run.ok", "Ran {count} step(s) in {path}; result written to {path}/_result_.yaml."),
    ("dat.run.incomplete", "DAT run in {path} stopped early; see {path}/_result_.yaml."),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the English fallback catalog while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the static English catalog used by the CLI.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

#[cfg(test)]
mod tests {
    use super::translate;
    use super::MessageArg;

    #[test]
    fn translate_substitutes_placeholders() {
        let output = translate(
            "pipeline.build_failed",
            vec![MessageArg::new("path", "scenario.yaml"), MessageArg::new("error", "boom")],
        );
        assert!(output.contains("scenario.yaml"));
        assert!(output.contains("boom"));
    }

    #[test]
    fn missing_key_falls_back_to_key_itself() {
        assert_eq!(translate("nonexistent.key", vec![]), "nonexistent.key");
    }

    #[test]
    fn t_macro_builds_args_in_order() {
        let message = crate::t!("config.validate.ok", path = "xenospec.toml");
        assert_eq!(message, "Config valid: xenospec.toml");
    }
}
