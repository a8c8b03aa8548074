// crates/xenospec-session/src/simulator.rs
// ============================================================================
// Module: XenoSpec Simulator Capability
// Description: The abstract collaborator interface a session drives.
// Purpose: Implements spec.md §1's "the session depends only on an abstract
// Simulator capability" — the biochemical simulator itself (rate-law
// integration, population dynamics, visibility/skinning) is out of scope and
// described only by this trait.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`Simulator`] is deliberately thin. A [`crate::Session`] never reaches
//! past this trait into whatever concrete biochemical model backs it; every
//! piece of simulated behavior the session needs — advancing time,
//! executing an action for real, starting a concurrent action, reading
//! visible state, and checking the simulator's own terminal condition — is
//! named here and nowhere else.
//!
//! Scheduling bookkeeping (which pending actions complete when, and in what
//! order) is the session's concern, not the simulator's: [`Simulator::time`]
//! is the single source of truth for "now", and [`Simulator::schedule`]
//! exists only so a concrete simulator can fold a concurrent action into its
//! own internal model (e.g. continuing rate-law integration underneath it)
//! — it does not hand firing control back to the session.

use serde_json::Value;

/// Errors a concrete [`Simulator`] raises executing an action for real.
///
/// Per spec.md §7's `SimulatorFailure` row, this is always translated into
/// an in-band `ActionResult` with `success = false`; it never aborts the
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorError(pub String);

impl std::fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SimulatorError {}

/// The abstract capability a [`crate::Session`] mediates between an agent
/// and the underlying world model.
///
/// # Invariants
/// - `time` only ever increases, and only in response to `advance`.
/// - `execute` never advances time itself; the session always calls
///   `advance` for `initiation_time`/`duration` before or after `execute` as
///   spec.md §4.8.2 prescribes.
pub trait Simulator {
    /// The simulator's current internal clock.
    fn time(&self) -> f64;

    /// Advances the simulator's internal clock by `delta` (which may be
    /// zero). Never executes an action or fires a completion — that is
    /// always a separate, explicit call from the session.
    fn advance(&mut self, delta: f64);

    /// Executes `name`/`params` for real, producing observation data.
    ///
    /// # Errors
    ///
    /// Returns a [`SimulatorError`] describing why the underlying model
    /// could not execute the action; the session turns this into a failed
    /// `ActionResult` rather than propagating it.
    fn execute(&mut self, name: &str, params: &Value) -> Result<Value, SimulatorError>;

    /// Notifies the simulator that a concurrent action has begun, with the
    /// session-computed `duration` it is expected to run for. Concrete
    /// simulators may use this to continue modeling the action's effect
    /// internally; the session's own scheduled-completion timeline (not
    /// this call) is what decides when the action's `completed` event is
    /// emitted.
    fn schedule(&mut self, name: &str, params: &Value, duration: f64);

    /// A snapshot of whatever state the simulator currently exposes to the
    /// agent (post skinning/visibility — that transformation is the
    /// simulator's job, not the session's, per the GLOSSARY).
    fn observable_state(&self) -> Value;

    /// Returns `true` if the simulator itself reports a terminal condition
    /// (spec.md §4.8.3 condition 6), such as population extinction.
    fn is_terminal(&self) -> bool;

    /// Returns the value of a named population/quantity the simulator
    /// tracks, used by scoring expressions' `population(species)` helper
    /// (spec.md §4.8.4). Returns `None` for an unrecognized name.
    fn population(&self, species: &str) -> Option<f64>;
}

#[cfg(test)]
pub(crate) mod test_support {
    //! A minimal in-memory [`Simulator`] used by this crate's own tests.
    #![allow(
        clippy::missing_docs_in_private_items,
        reason = "test-only scaffolding, not part of the crate's public surface"
    )]

    use std::collections::HashMap;

    use serde_json::Value;
    use serde_json::json;

    use super::Simulator;
    use super::SimulatorError;

    #[derive(Debug, Default)]
    pub struct StubSimulator {
        pub time: f64,
        pub terminal: bool,
        pub populations: HashMap<String, f64>,
        pub executed: Vec<(String, Value)>,
        pub scheduled: Vec<(String, Value, f64)>,
        pub fail_action: Option<String>,
    }

    impl Simulator for StubSimulator {
        fn time(&self) -> f64 {
            self.time
        }

        fn advance(&mut self, delta: f64) {
            self.time += delta;
        }

        fn execute(&mut self, name: &str, params: &Value) -> Result<Value, SimulatorError> {
            if self.fail_action.as_deref() == Some(name) {
                return Err(SimulatorError(format!("simulator refused `{name}`")));
            }
            self.executed.push((name.to_owned(), params.clone()));
            Ok(json!({ "name": name }))
        }

        fn schedule(&mut self, name: &str, params: &Value, duration: f64) {
            self.scheduled.push((name.to_owned(), params.clone(), duration));
        }

        fn observable_state(&self) -> Value {
            json!({ "time": self.time })
        }

        fn is_terminal(&self) -> bool {
            self.terminal
        }

        fn population(&self, species: &str) -> Option<f64> {
            self.populations.get(species).copied()
        }
    }
}
