// crates/xenospec-experiment/src/lib.rs
// ============================================================================
// Crate: xenospec-experiment
// Description: Axis enumeration, per-run seed mixing, and aggregation of
// Session results across an experiment's combination sweep.
// Purpose: Implements the "Experiment Runner" module of spec.md §4.9.
// Dependencies: indexmap, rand, rand_chacha, rayon (optional), thiserror,
// xenospec-eval, xenospec-hydrate, xenospec-session, xenospec-yaml
// ============================================================================

//! ## Overview
//! An experiment sweeps a scenario across every combination a set of named
//! axes selects, driving one [`xenospec_session::Session`] per combination
//! and collecting a [`RunRecord`] of its scores and final state. This crate
//! owns combination enumeration ([`axis`]), the experiment entity's static
//! content ([`spec`]), per-run seed derivation ([`seed`]), and the run loop
//! itself ([`runner`]); it never constructs a concrete `Simulator`/`Agent`
//! pair, since that is scenario-specific and lives with the caller.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod axis;
pub mod error;
pub mod runner;
pub mod seed;
pub mod spec;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use axis::Combination;
pub use axis::SampleOutcome;
pub use axis::combinations;
pub use axis::sample;
pub use error::ExperimentError;
pub use runner::ExperimentOutcome;
pub use runner::RunRecord;
pub use runner::run;
pub use seed::derive_run_seed;
pub use spec::Exploration;
pub use spec::ExperimentSpec;

#[cfg(feature = "parallel")]
pub use runner::run_parallel;
