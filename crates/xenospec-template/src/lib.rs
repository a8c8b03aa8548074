// crates/xenospec-template/src/lib.rs
// ============================================================================
// Module: XenoSpec Template
// Description: The parametric template expander: `_params_`, `_instantiate_`
// index loops, `_ports_` wiring, `_modify_` edits, and guards.
// Purpose: Crate root — re-exports the public build-stage surface.
// Dependencies: indexmap, xenospec-core, xenospec-eval, xenospec-resolve,
// xenospec-scope, xenospec-yaml
// ============================================================================

//! ## Overview
//! This crate turns a hydrated entity's body into its fully expanded form,
//! per spec.md §4.6. It has no dependency on a fetch engine, so template
//! loading is mediated by the caller-supplied [`TemplateLoader`] trait.

#![forbid(unsafe_code)]

mod error;
mod expander;
mod guard;
mod instantiate;
mod loop_key;
mod modify;
mod params;
mod ports;

pub use error::TemplateError;
pub use expander::expand;
pub use expander::ExpansionOutcome;
pub use guard::check_guard;
pub use guard::run_guard;
pub use guard::FailMode;
pub use guard::Guard;
pub use guard::GuardApplication;
pub use guard::GuardCheckError;
pub use guard::GuardContext;
pub use guard::GuardRegistry;
pub use guard::GuardViolation;
pub use instantiate::ResolvedInstance;
pub use instantiate::TemplateLoader;
pub use loop_key::expand_instances;
pub use loop_key::parse_as_key;
pub use loop_key::AsKey;
pub use loop_key::Instance;
pub use modify::apply_modify;
pub use params::resolve_params;
pub use ports::bind_ports;
pub use ports::parse_ports;
pub use ports::Direction;
pub use ports::PortBinding;
pub use ports::PortDecl;
