// crates/xenospec-session/src/agent.rs
// ============================================================================
// Module: XenoSpec Agent Capability
// Description: The abstract decision-maker a session drives against a
// scenario.
// Purpose: Implements spec.md §1's "agent under evaluation" as a trait the
// rest of this crate is agnostic to the implementation of.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! An [`Agent`] is whatever is being evaluated: a scripted policy in a test,
//! a hard-coded baseline, or (in a real evaluation) a language-model-backed
//! decision loop living outside this crate entirely. [`crate::Session`]
//! only ever calls the four methods below, in the order `start`, then
//! `decide`/`observe_result` alternating until the session reports it is
//! done, then `end`.

use serde_json::Value;

use crate::action::Action;
use crate::action::ActionResult;

/// A decision-maker driven by a [`crate::Session`].
///
/// # Invariants
/// - `decide` is never called once the owning session's `is_done` returns
///   `true`.
/// - `observe_result` is called exactly once for every `Action` `decide`
///   returned, whether or not the simulator accepted it.
pub trait Agent {
    /// Called once, before the first `decide`, with the scenario's briefing
    /// text and the initial observable state.
    fn start(&mut self, briefing: &str, initial_state: &Value);

    /// Asked to choose the next action given the current observable state.
    /// Returning `None` ends the episode voluntarily (spec.md §4.8.3
    /// condition 1).
    fn decide(&mut self, observable_state: &Value) -> Option<Action>;

    /// Informed of the outcome of an action it previously chose.
    fn observe_result(&mut self, result: &ActionResult);

    /// Called once the session has ended, with the final score if scoring
    /// is configured.
    fn end(&mut self, final_state: &Value, score: Option<f64>);
}
