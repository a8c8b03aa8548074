// crates/xenospec-scope/src/lib.rs
// ============================================================================
// Module: XenoSpec Scope
// Description: The lexical scope graph: parent pointers, dotted-name lookup,
// `extends` overrides, and tombstone shadowing.
// Purpose: Give the hydrator and template expander a single place to answer
// "what does this name resolve to from here".
// Dependencies: indexmap, xenospec-core, xenospec-yaml
// ============================================================================

//! Lexical scope graph over a resolved [`xenospec_yaml::Node`] tree.
//!
//! Built after reference resolution and before hydration (spec.md §4.3).
//! Scopes are stored in a flat arena (`ScopeGraph`) addressed by [`ScopeId`]
//! rather than linked through `Rc`/`RefCell`, so the graph is plain data that
//! can be handed to worker threads by value.

#![forbid(unsafe_code)]

mod error;
mod graph;

pub use error::ScopeError;
pub use graph::Binding;
pub use graph::LookupOutcome;
pub use graph::ScopeGraph;
pub use graph::ScopeId;
