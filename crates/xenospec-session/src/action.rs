// crates/xenospec-session/src/action.rs
// ============================================================================
// Module: XenoSpec Action Model
// Description: What an agent submits, what the interface declares it can
// submit, and what comes back.
// Purpose: Implements the action/measurement vocabulary of spec.md §4.8.2
// and the interface catalog entries it is validated against.
// Dependencies: indexmap, serde_json, xenospec-eval
// ============================================================================

//! ## Overview
//! An [`Action`] is what an [`crate::Agent`] submits to
//! [`crate::Session::act`]. An [`ActionSpec`] is what a scenario's
//! `interface:` catalog declares about a named action or measurement:
//! its own `duration`/`cost`/`wait` overrides, innermost in the three-level
//! precedence spec.md §4.8.2 step 5 describes. [`ActionResult`] is what
//! comes back, and is also what is recorded in the [`crate::Timeline`]'s
//! `result`/`completed` events.

use indexmap::IndexMap;
use serde_json::Value;

/// Whether a submitted action is a world-mutating action or a
/// non-mutating measurement.
///
/// Measurements are never scheduled (spec.md §5): they always execute
/// immediately and never advance simulated time beyond `initiation_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// A world-mutating action, dispatched through [`crate::Simulator::execute`]
    /// or [`crate::Simulator::schedule`] depending on `wait`.
    Action,
    /// A non-mutating measurement, always synchronous.
    Measurement,
}

/// One action an [`crate::Agent`] submits to [`crate::Session::act`].
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// The action or measurement's name, looked up in the scenario's
    /// interface catalog.
    pub name: String,
    /// Parameters passed through to the simulator and made available to
    /// cost-formula evaluation.
    pub params: Value,
    /// Action or measurement.
    pub kind: ActionKind,
    /// An explicit per-call override of turn-based vs. concurrent
    /// dispatch. `None` defers to the interface entry's `default_wait`,
    /// then the global default (spec.md §4.8.2 step 5).
    pub wait: Option<bool>,
}

/// A constant cost, or a formula evaluated with the action's params in
/// scope.
#[derive(Debug, Clone, PartialEq)]
pub enum CostSpec {
    /// A fixed numeric cost.
    Constant(f64),
    /// An unparsed evaluator-language expression, evaluated with the
    /// action's params bound as names.
    Formula(String),
}

/// One entry in a scenario's `interface.actions`/`interface.measurements`
/// catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpec {
    /// The action or measurement's name.
    pub name: String,
    /// Action or measurement.
    pub kind: ActionKind,
    /// This entry's own `duration` override, if declared.
    pub duration: Option<f64>,
    /// This entry's own `cost` override, if declared.
    pub cost: Option<CostSpec>,
    /// This entry's own `wait` default, innermost-but-one in the
    /// precedence an explicit per-call `wait` still overrides.
    pub default_wait: Option<bool>,
    /// Free-form parameter schema/documentation, carried through for the
    /// observation contract's interface catalog but not otherwise
    /// interpreted.
    pub schema: IndexMap<String, Value>,
}

/// The outcome of one `act()` call, and what is recorded on a
/// `result`/`completed` timeline event.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    /// Whether the action succeeded.
    pub success: bool,
    /// The cost charged for this outcome.
    pub cost: f64,
    /// Data the simulator produced executing the action, or `Value::Null`
    /// for a concurrent `initiated` acknowledgement.
    pub data: Value,
    /// An error message, present only when `success` is `false`.
    pub error: Option<String>,
    /// Whether this outcome has already completed (`true` for turn-based
    /// results and drained completions) or is still pending
    /// (`false`, with `completion_time` set, for a fresh concurrent
    /// `initiated` acknowledgement).
    pub completed: bool,
    /// The simulation time this action is scheduled to complete at, set
    /// only on a pending concurrent acknowledgement.
    pub completion_time: Option<f64>,
}

impl ActionResult {
    /// Builds the synthetic failed result spec.md §4.8.2 step 1 describes
    /// for an action naming an unknown interface entry.
    #[must_use]
    pub fn unknown_action(name: &str, error_cost: f64) -> Self {
        ActionResult {
            success: false,
            cost: error_cost,
            data: Value::Null,
            error: Some(format!("Unknown action `{name}`")),
            completed: true,
            completion_time: None,
        }
    }
}
