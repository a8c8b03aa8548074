// crates/xenospec-eval/src/lib.rs
// ============================================================================
// Module: XenoSpec Eval
// Description: Lexer, parser, and interpreter for the `!ev` deferred
// expression language, plus its closed set of named distributions.
// Purpose: Let the hydrator and template expander defer a bound value's
// computation until a lexical scope exists to evaluate it against
// (spec.md §3, §4.4).
// Dependencies: rand, rand_chacha, rand_distr, serde, sha2, xenospec-core
// ============================================================================

//! ## Overview
//! Evaluation of a single `!ev` string happens in three steps:
//!
//! 1. [`parse`] turns the source text into an [`Expr`] tree.
//! 2. [`evaluate`] walks that tree against a [`NameResolver`] (supplied by
//!    the caller, wrapping whatever scope graph is active) and a seeded RNG
//!    substream (see [`derive_rng`]).
//! 3. The result is an [`EvalValue`] — null, bool, int, float, string, or a
//!    list of the same.
//!
//! This crate has no notion of a scope graph itself; [`NameResolver`] is the
//! seam higher-level crates implement to wire one in, keeping this crate's
//! dependency footprint to the expression language alone.

#![forbid(unsafe_code)]

mod distributions;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod rng;
mod value;

pub use error::EvalError;
pub use error::LexError;
pub use error::ParseError;
pub use interpreter::evaluate;
pub use interpreter::evaluate_str;
pub use interpreter::EmptyResolver;
pub use interpreter::NameResolver;
pub use lexer::tokenize;
pub use lexer::Token;
pub use parser::parse;
pub use parser::parse_fstring;
pub use parser::BinaryOp;
pub use parser::Expr;
pub use parser::FStringPart;
pub use rng::derive_rng;
pub use value::EvalValue;
