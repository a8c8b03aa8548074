// crates/xenospec-eval/src/error.rs
// ============================================================================
// Module: XenoSpec Eval Errors
// Description: Diagnostics for lexing, parsing, and evaluating `!ev`
// expressions.
// Purpose: A closed error set covering every way the deferred-expression
// language can fail (spec.md §4.4, §7).
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Errors raised while lexing, parsing, or evaluating a deferred (`!ev`)
//! expression string.

use thiserror::Error;

/// Errors raised while tokenizing expression source text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    /// An unrecognized character was encountered.
    #[error("unexpected character `{ch}` at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset within the source text.
        offset: usize,
    },
    /// A string literal was never closed.
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString {
        /// Byte offset where the string began.
        offset: usize,
    },
    /// An f-string interpolation group (`{...}`) was never closed.
    #[error("unterminated interpolation group starting at offset {offset}")]
    UnterminatedInterpolation {
        /// Byte offset where the group began.
        offset: usize,
    },
}

/// Errors raised while parsing a token stream into an expression tree.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// Tokenizing failed.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// The token stream ended where another token was expected.
    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd {
        /// Description of what was expected.
        expected: String,
    },
    /// A token appeared where it could not be parsed.
    #[error("unexpected token `{found}`, expected {expected}")]
    UnexpectedToken {
        /// The unexpected token's text.
        found: String,
        /// Description of what was expected.
        expected: String,
    },
}

/// Errors raised while evaluating a parsed expression against a scope and
/// RNG substream.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Parsing the expression source failed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A dotted name did not resolve via the active [`crate::NameResolver`].
    #[error("unresolved name `{name}`")]
    UnresolvedName {
        /// The unresolved dotted name.
        name: String,
    },
    /// An operator or function required a numeric operand but received a
    /// non-numeric value.
    #[error("expected a numeric value, found {found}")]
    NotNumeric {
        /// The type name of the offending value.
        found: &'static str,
    },
    /// Division (`/`) by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// A function call named something outside the closed primitive set.
    #[error("unknown function `{name}`")]
    UnknownFunction {
        /// The offending function name.
        name: String,
    },
    /// A function call supplied the wrong number of arguments.
    #[error("`{name}` expects {expected} argument(s), found {found}")]
    ArityMismatch {
        /// The function name.
        name: String,
        /// Expected argument count, as a human-readable description.
        expected: &'static str,
        /// Argument count actually supplied.
        found: usize,
    },
    /// `discrete`'s `values` and `weights` arguments had different lengths.
    #[error("discrete() values and weights must have the same length, found {values} and {weights}")]
    DiscreteLengthMismatch {
        /// Length of the `values` list.
        values: usize,
        /// Length of the `weights` list.
        weights: usize,
    },
    /// `discrete`'s weights summed to zero, so none could be normalized.
    #[error("discrete() weights sum to zero")]
    DiscreteZeroWeight,
    /// `choice()` was called with no options.
    #[error("choice() requires at least one option")]
    EmptyChoice,
    /// An f-string interpolation group evaluated to a value that could not
    /// be interpolated (a list).
    #[error("cannot interpolate a list value into a string")]
    NotInterpolatable,
}
