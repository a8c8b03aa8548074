// crates/xenospec-yaml/src/lib.rs
// ============================================================================
// Module: XenoSpec YAML
// Description: YAML loading into a tagged, source-spanned node tree, plus the
// engine's on-disk configuration.
// Purpose: Turn scenario YAML text into the `Node` tree that
// xenospec-resolve, xenospec-scope, and xenospec-hydrate operate on.
// Dependencies: serde, serde_yaml, indexmap, thiserror, toml
// ============================================================================

//! YAML loading and engine configuration for the XenoSpec spec engine.
//!
//! This crate owns exactly one concern: turning YAML text into a [`Node`]
//! tree that preserves mapping key order and tags every node with the
//! [`xenospec_core::SourceSpan`] it came from. It does not resolve
//! `!include`/`!ref` (that is `xenospec-resolve`), does not build scopes
//! (`xenospec-scope`), and does not evaluate `!ev` (`xenospec-eval`).

#![forbid(unsafe_code)]

mod config;
mod loader;
mod node;

pub use config::EngineConfig;
pub use config::FetchRoots;
pub use config::GuardDefaults;
pub use config::ParamDefaults;
pub use loader::load_file;
pub use loader::load_str;
pub use loader::LoadError;
pub use node::Mapping;
pub use node::Node;
pub use node::NodeValue;
pub use node::Scalar;
pub use node::TagValue;
