// crates/xenospec-experiment/src/error.rs
// ============================================================================
// Module: XenoSpec Experiment Errors
// Description: Diagnostics for parsing an experiment entity and driving its
// combination sweep.
// Purpose: A closed error set covering malformed experiment bodies and
// session-level failures the runner cannot recover from.
// Dependencies: thiserror, xenospec-session
// ============================================================================

use thiserror::Error;

/// Errors raised constructing or running an [`crate::ExperimentSpec`].
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// The experiment entity's body had no `axes:` section.
    #[error("experiment `{experiment}` has no `axes:` section")]
    MissingAxes {
        /// The experiment's dotted name.
        experiment: String,
    },
    /// An axis declared no values to iterate or sample over.
    #[error("axis `{axis}` has no declared values")]
    EmptyAxis {
        /// The offending axis name.
        axis: String,
    },
    /// `exploration` named something other than `iterate`/`sample`.
    #[error("unknown exploration mode `{mode}`, expected `iterate` or `sample`")]
    UnknownExploration {
        /// The offending mode string.
        mode: String,
    },
    /// `exploration: sample` with no `samples` count given.
    #[error("exploration `sample` requires a `samples` count")]
    MissingSampleCount,
    /// A run's session raised an error evaluating a cost, termination, or
    /// scoring expression.
    #[error("run {index} failed: {source}")]
    RunFailed {
        /// The combination index that failed.
        index: usize,
        /// The underlying session error.
        #[source]
        source: xenospec_session::SessionError,
    },
}
