// crates/xenospec-hydrate/src/error.rs
// ============================================================================
// Module: XenoSpec Hydrate Errors
// Description: Diagnostics raised while hydrating typed elements into
// entities.
// Purpose: A closed error set for type-registry lookups and constructor
// validation failures (spec.md §4.5, §7 SchemaError).
// Dependencies: thiserror, xenospec-core
// ============================================================================

//! ## Overview
//! Hydration itself rarely fails: an unregistered type tag is explicitly not
//! an error (spec.md §4.5 — "typed-element syntax is opt-in"). What remains
//! is a registered constructor rejecting a malformed body.

use thiserror::Error;
use xenospec_core::SourceSpan;

/// Errors raised while hydrating a resolved, scoped tree into entities.
#[derive(Debug, Error)]
pub enum HydrateError {
    /// A registered constructor rejected an element's body.
    #[error("`{type_tag}.{name}` failed to hydrate: {message}")]
    Constructor {
        /// The type tag that rejected the body.
        type_tag: String,
        /// The element's dotted name.
        name: String,
        /// A human-readable description of the failure.
        message: String,
        /// Source location of the offending element.
        span: SourceSpan,
    },
    /// A type name was registered twice.
    #[error("type `{type_tag}` is already registered")]
    DuplicateType {
        /// The offending type tag.
        type_tag: String,
    },
}
