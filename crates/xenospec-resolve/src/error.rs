// crates/xenospec-resolve/src/error.rs
// ============================================================================
// Module: XenoSpec Resolve Errors
// Description: Diagnostics for `!include`/`!ref` expansion.
// Purpose: Source-located errors for cyclic includes/references and
// unresolved reference targets (spec.md §4.2, §7 ResolutionError).
// Dependencies: thiserror, xenospec-core, xenospec-fetch
// ============================================================================

//! ## Overview
//! Errors raised while expanding `!include` and `!ref` tags into plain tree
//! structure. All are fatal to hydration per spec.md §7's `ResolutionError`
//! row.

use thiserror::Error;
use xenospec_core::SourceSpan;
use xenospec_fetch::FetchError;
use xenospec_yaml::LoadError;

/// Errors raised by [`crate::resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// An `!include` chain re-entered a file it was already in the middle of
    /// expanding.
    #[error("cyclic include involving `{path}` at {span}")]
    CyclicInclude {
        /// The include path that closed the cycle.
        path: String,
        /// Where the offending `!include` appeared.
        span: SourceSpan,
    },
    /// A `!ref` chain re-entered a name it was already in the middle of
    /// expanding.
    #[error("cyclic reference involving `{name}` at {span}")]
    CyclicReference {
        /// The reference name that closed the cycle.
        name: String,
        /// Where the offending `!ref` appeared.
        span: SourceSpan,
    },
    /// A `!ref` named a target that could not be found in scope or via the
    /// fetch fallback layer.
    #[error("unresolved reference `{name}` at {span}")]
    UnresolvedReference {
        /// The unresolved dotted name.
        name: String,
        /// Where the offending `!ref` appeared.
        span: SourceSpan,
    },
    /// An `!include` target could not be loaded.
    #[error("failed to include `{path}` at {span}: {source}")]
    IncludeLoad {
        /// The include path that failed to load.
        path: String,
        /// Where the offending `!include` appeared.
        span: SourceSpan,
        /// Underlying load error.
        #[source]
        source: LoadError,
    },
    /// A `!ref` fell through to the fetch layer, which itself failed.
    #[error("reference `{name}` fell through to fetch at {span}: {source}")]
    FetchFallback {
        /// The dotted name that fell through to fetch.
        name: String,
        /// Where the offending `!ref` appeared.
        span: SourceSpan,
        /// Underlying fetch error.
        #[source]
        source: FetchError,
    },
}
