// crates/xenospec-core/src/lib.rs
// ============================================================================
// Module: XenoSpec Core
// Description: Shared identifiers, specifiers, source spans, and canonical
// hashing used by every other crate in the workspace.
// Purpose: Give the pipeline crates (yaml, scope, resolve, eval, hydrate,
// template, fetch, session, experiment) a single vocabulary for "what is this
// thing" and "where did it come from" without depending on each other.
// Dependencies: serde, serde_json, serde_jcs, sha2, thiserror
// ============================================================================

//! Foundational types shared across the XenoSpec workspace.
//!
//! This crate has no knowledge of YAML, scopes, or sessions — it only defines
//! the identifiers and location/hash primitives that every other crate builds
//! on top of.

#![forbid(unsafe_code)]

mod hashing;
mod identifiers;
mod span;
mod specifier;

pub use hashing::canonical_json_bytes;
pub use hashing::hash_bytes;
pub use hashing::hash_canonical_json;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use identifiers::ExperimentId;
pub use identifiers::ScenarioId;
pub use identifiers::SessionId;
pub use identifiers::SpecVersion;
pub use identifiers::SpeciesId;
pub use span::SourceId;
pub use span::SourceSpan;
pub use specifier::CanonicalPath;
pub use specifier::Specifier;
pub use specifier::SpecifierForm;
