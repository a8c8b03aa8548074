// crates/xenospec-core/src/span.rs
// ============================================================================
// Module: XenoSpec Source Spans
// Description: Source-location context attached to loaded nodes and
// diagnostics.
// Purpose: Let every error in the load/resolve/hydrate pipeline point back at
// the file, line, and column that produced it.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`SourceId`] names where a document came from (a file path, a DAT entry,
//! or an inline string); a [`SourceSpan`] pins a location within it. Every
//! `Node` produced by the loader and every diagnostic raised downstream
//! carries one.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Identifies the origin document of a loaded node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Creates a source id from a human-readable origin description, such as
    /// a filesystem path or `"<inline>"`.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }

    /// Returns the origin description as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A one-based line/column location within a [`SourceId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Document the span points into.
    pub source: SourceId,
    /// One-based line number.
    pub line: u32,
    /// One-based column number.
    pub column: u32,
}

impl SourceSpan {
    /// Creates a new source span.
    #[must_use]
    pub fn new(source: SourceId, line: u32, column: u32) -> Self {
        Self {
            source,
            line,
            column,
        }
    }

    /// Builds a span for a source whose location is not otherwise tracked,
    /// such as a programmatically constructed node.
    #[must_use]
    pub fn unknown(source: SourceId) -> Self {
        Self::new(source, 0, 0)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_file_line_column() {
        let span = SourceSpan::new(SourceId::from("scenario.yaml"), 12, 5);
        assert_eq!(span.to_string(), "scenario.yaml:12:5");
    }
}
