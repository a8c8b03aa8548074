// crates/xenospec-session/src/error.rs
// ============================================================================
// Module: XenoSpec Session Errors
// Description: Diagnostics for scenario construction and session lifecycle
// boundary conditions.
// Purpose: A closed error set distinguishing fatal construction failures
// (spec.md §7 SchemaError) from the in-band `ActionResult` failures a
// session produces for everything an agent can react to.
// Dependencies: thiserror, xenospec-core, xenospec-eval
// ============================================================================

//! ## Overview
//! Most of what can go wrong once a session is running is folded into an
//! in-band [`crate::ActionResult`] (spec.md §7: "the session boundary...
//! MUST translate simulator and action errors into in-band ActionResults").
//! What remains here is everything that is fatal before or around that
//! boundary: a malformed scenario body, or calling `act` after the session
//! has already terminated.

use thiserror::Error;

/// Errors raised while constructing a [`crate::Scenario`] from a hydrated
/// entity's body, or while driving a [`crate::Session`] outside its
/// documented lifecycle.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The scenario entity's body had no `interface:` section at all.
    #[error("scenario `{scenario}` has no `interface:` section")]
    MissingInterface {
        /// The scenario's dotted name.
        scenario: String,
    },
    /// An `interface.actions`/`interface.measurements` entry was malformed.
    #[error("interface entry `{name}` is malformed: {message}")]
    MalformedInterfaceEntry {
        /// The offending entry's name.
        name: String,
        /// A human-readable description of the failure.
        message: String,
    },
    /// A cost formula or termination/scoring expression failed to parse.
    #[error("expression `{source_text}` failed to parse: {source}")]
    ExpressionParse {
        /// The offending source text.
        source_text: String,
        /// The underlying parse error.
        #[source]
        source: xenospec_eval::ParseError,
    },
    /// A cost formula, termination, or scoring expression failed to
    /// evaluate once constructed.
    #[error("expression `{source_text}` failed to evaluate: {source}")]
    ExpressionEval {
        /// The offending source text.
        source_text: String,
        /// The underlying evaluation error.
        #[source]
        source: xenospec_eval::EvalError,
    },
    /// `act` was called after [`crate::Session::is_done`] already returned
    /// `true` (spec.md scenario 3: "subsequent `act()` calls...are
    /// rejected").
    #[error("session has already terminated; {reason}")]
    Terminated {
        /// Why the session terminated.
        reason: String,
    },
}
