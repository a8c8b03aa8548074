// crates/xenospec-fetch/src/error.rs
// ============================================================================
// Module: XenoSpec Fetch Errors
// Description: Diagnostics for specifier resolution and DAT loading.
// Purpose: Give callers a closed error set for every way `fetch` can fail.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Errors raised while resolving a [`xenospec_core::Specifier`] to content.

use thiserror::Error;
use xenospec_yaml::LoadError;

/// Errors raised by [`crate::FetchEngine::fetch`] and its raw variant.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No module, DAT, or file satisfied the specifier under any resolution
    /// rule in spec.md §4.7.
    #[error("not found: `{specifier}`")]
    NotFound {
        /// The specifier text that could not be resolved.
        specifier: String,
    },
    /// A DAT folder or single-file DAT existed but had no `index.yaml` (or
    /// equivalent single-file content) to load.
    #[error("`{path}` has no index.yaml and is not a single-file DAT")]
    MissingIndex {
        /// Path of the DAT folder missing its index.
        path: String,
    },
    /// A trailing dotted suffix on a path specifier dereferenced past the
    /// end of the loaded content.
    #[error("`{specifier}` has no member `{segment}`")]
    NoSuchMember {
        /// The specifier being dereferenced.
        specifier: String,
        /// The dotted segment that could not be found.
        segment: String,
    },
    /// The underlying YAML failed to load.
    #[error("failed to load `{path}`: {source}")]
    Load {
        /// Path of the file that failed to load.
        path: String,
        /// Underlying load error.
        #[source]
        source: LoadError,
    },
    /// An I/O operation (reading a directory, stat-ing a path) failed.
    #[error("io error at `{path}`: {message}")]
    Io {
        /// Path the I/O operation targeted.
        path: String,
        /// Underlying message.
        message: String,
    },
    /// A relative specifier (`./...`) was used with no current DAT in
    /// context to resolve it against.
    #[error("relative specifier `{specifier}` used with no current DAT in scope")]
    NoCurrentDat {
        /// The offending relative specifier.
        specifier: String,
    },
    /// The identity cache's mutex was poisoned by a panic in another thread
    /// holding the lock.
    #[error("identity cache mutex poisoned")]
    CachePoisoned,
}
