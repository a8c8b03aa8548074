// crates/xenospec-scope/src/error.rs
// ============================================================================
// Module: XenoSpec Scope Errors
// Description: Diagnostics for scope construction and lookup.
// Purpose: Source-located errors for cyclic `extends` chains and malformed
// typed elements.
// Dependencies: thiserror, xenospec-core
// ============================================================================

//! ## Overview
//! Errors raised while building or querying a [`crate::ScopeGraph`].

use thiserror::Error;
use xenospec_core::SourceSpan;

/// Errors raised while building or querying a scope graph.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// An `extends:` chain referred back to one of its own ancestors.
    #[error("cyclic extends chain involving `{name}` at {span}")]
    CyclicExtends {
        /// The name whose `extends:` target closed the cycle.
        name: String,
        /// Where the offending `extends:` key appeared.
        span: SourceSpan,
    },
    /// An `extends:` key named a scope that does not exist.
    #[error("extends target `{target}` not found at {span}")]
    UnknownExtendsTarget {
        /// The missing target name.
        target: String,
        /// Where the `extends:` key appeared.
        span: SourceSpan,
    },
    /// A typed element key (`T.N:`) used a malformed dotted name.
    #[error("malformed typed element key `{key}` at {span}")]
    MalformedTypedKey {
        /// The offending key text.
        key: String,
        /// Where the key appeared.
        span: SourceSpan,
    },
}
