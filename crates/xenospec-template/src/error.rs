// crates/xenospec-template/src/error.rs
// ============================================================================
// Module: XenoSpec Template Errors
// Description: Diagnostics raised while expanding `_params_`/`_instantiate_`/
// `_ports_`/`_modify_` directives and running guards.
// Purpose: A closed error set for the build stage (spec.md §4.6, §7
// GuardViolation).
// Dependencies: thiserror, xenospec-core, xenospec-eval
// ============================================================================

//! ## Overview
//! Errors from template expansion are fatal to the build stage, matching
//! `GuardViolation`'s place in the error taxonomy (spec.md §7): they abort
//! the build rather than being recorded in-band like a session action
//! failure.

use thiserror::Error;
use xenospec_core::SourceSpan;

/// Errors raised while expanding a template or applying its directives.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// `_template_:` named a path the loader could not produce.
    #[error("could not load template `{path}`: {message}")]
    TemplateLoad {
        /// The requested template path.
        path: String,
        /// A human-readable description of the failure.
        message: String,
    },
    /// A `_params_:` default or inline override failed to evaluate.
    #[error("parameter `{name}` failed to evaluate: {source}")]
    ParamEval {
        /// The parameter's name.
        name: String,
        /// The underlying evaluation error.
        #[source]
        source: xenospec_eval::EvalError,
    },
    /// An `_as_ NAME{i in RANGE}:` key's range expression was malformed.
    #[error("malformed index-loop key `{key}`: {message}")]
    InvalidIndexLoop {
        /// The offending key text.
        key: String,
        /// A human-readable description of the failure.
        message: String,
    },
    /// A `_ports_:` declaration was malformed (expected `type.direction`).
    #[error("malformed port declaration `{path}`: {value}")]
    InvalidPort {
        /// The port's declared path.
        path: String,
        /// The offending declared type/direction text.
        value: String,
    },
    /// `_modify_:` named an operation outside `_append_`/`_set_`/`_merge_`.
    #[error("unknown `_modify_` operation `{op}`")]
    UnknownModifyOp {
        /// The offending operation name.
        op: String,
    },
    /// `_modify_:`'s target path did not resolve within the expanded
    /// subtree.
    #[error("`_modify_` target path `{path}` does not resolve")]
    ModifyTargetNotFound {
        /// The dotted target path.
        path: String,
    },
    /// A named guard was applied but never registered.
    #[error("guard `{name}` is not registered")]
    UnknownGuard {
        /// The guard's name.
        name: String,
    },
    /// A guard name was registered twice in the same registry.
    #[error("guard `{name}` is already registered")]
    DuplicateGuard {
        /// The guard's name.
        name: String,
    },
    /// A guard rejected expanded content (`reject` fail mode, the default).
    #[error("guard `{guard}` rejected the expansion: {message}")]
    GuardRejected {
        /// The guard's name.
        guard: String,
        /// The violation's description.
        message: String,
        /// Source location of the offending content.
        span: SourceSpan,
    },
    /// A guard's `retry` fail mode exhausted its attempt budget.
    #[error("guard `{guard}` failed after {max_attempts} attempt(s): {message}")]
    GuardRetriesExhausted {
        /// The guard's name.
        guard: String,
        /// The configured attempt ceiling.
        max_attempts: u32,
        /// The last violation's description.
        message: String,
    },
}
