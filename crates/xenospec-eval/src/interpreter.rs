// crates/xenospec-eval/src/interpreter.rs
// ============================================================================
// Module: XenoSpec Eval Interpreter
// Description: Tree-walking evaluator for the `!ev` expression AST.
// Purpose: Resolve names against the active scope, sample distributions
// deterministically, and interpolate f-strings (spec.md §3, §4.4).
// Dependencies: crate::{distributions, error, parser, rng, value}
// ============================================================================

//! ## Overview
//! [`evaluate`] is the single public entry point. Callers supply:
//!
//! - the parsed [`Expr`] tree (see [`crate::parser::parse`]),
//! - a [`NameResolver`] implementation wrapping whatever scope graph is
//!   active at the call site,
//! - the run's top-level seed, and
//! - a stable path identifier for this `!ev` binding.
//!
//! Each distribution call encountered during the walk gets its own RNG
//! substream, keyed by `path` plus a zero-based call-site index assigned in
//! deterministic left-to-right evaluation order — so two distribution calls
//! within the same expression never share draws, and re-evaluating the same
//! expression under the same seed always reproduces the same sequence.

use std::cell::Cell;

use crate::distributions;
use crate::error::EvalError;
use crate::parser::BinaryOp;
use crate::parser::Expr;
use crate::parser::FStringPart;
use crate::rng::derive_rng;
use crate::value::EvalValue;

/// Resolves a dotted name against whatever lexical scope is active at an
/// `!ev` binding's location.
///
/// Implemented by higher-level crates wrapping a scope graph, so this crate
/// never needs to depend on one directly.
pub trait NameResolver {
    /// Looks up `dotted_name`, returning `None` if it is unbound.
    fn resolve(&self, dotted_name: &str) -> Option<EvalValue>;
}

/// A [`NameResolver`] with no bindings, useful for evaluating constant
/// expressions and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyResolver;

impl NameResolver for EmptyResolver {
    fn resolve(&self, _dotted_name: &str) -> Option<EvalValue> {
        None
    }
}

/// Evaluates `expr` against `resolver`, deriving distribution draws from
/// `seed` and `path`.
///
/// # Errors
///
/// Returns [`EvalError`] for unresolved names, type mismatches, division by
/// zero, unknown functions, or malformed distribution arguments.
pub fn evaluate(
    expr: &Expr,
    resolver: &dyn NameResolver,
    seed: u64,
    path: &str,
) -> Result<EvalValue, EvalError> {
    let ctx = Context {
        resolver,
        seed,
        path,
        call_index: Cell::new(0),
    };
    ctx.eval(expr)
}

/// Parses and evaluates `source` in one step. A thin convenience wrapper
/// over [`crate::parser::parse`] + [`evaluate`].
///
/// # Errors
///
/// Returns [`EvalError::Parse`] if `source` fails to lex or parse, or the
/// usual evaluation errors otherwise.
pub fn evaluate_str(
    source: &str,
    resolver: &dyn NameResolver,
    seed: u64,
    path: &str,
) -> Result<EvalValue, EvalError> {
    let expr = crate::parser::parse(source)?;
    evaluate(&expr, resolver, seed, path)
}

/// Per-evaluation state threaded through the tree walk.
struct Context<'a> {
    /// Resolves dotted names against the active scope.
    resolver: &'a dyn NameResolver,
    /// The run's top-level seed.
    seed: u64,
    /// Stable path identifier for this `!ev` binding.
    path: &'a str,
    /// Zero-based index of the next distribution call site encountered, in
    /// left-to-right evaluation order.
    call_index: Cell<usize>,
}

impl Context<'_> {
    /// Evaluates a single AST node, recursing into its children.
    fn eval(&self, expr: &Expr) -> Result<EvalValue, EvalError> {
        match expr {
            Expr::Null => Ok(EvalValue::Null),
            Expr::Bool(b) => Ok(EvalValue::Bool(*b)),
            Expr::Int(i) => Ok(EvalValue::Int(*i)),
            Expr::Float(f) => Ok(EvalValue::Float(*f)),
            Expr::Str(s) => Ok(EvalValue::Str(s.clone())),
            Expr::FString(parts) => self.eval_fstring(parts),
            Expr::Name(name) => self
                .resolver
                .resolve(name)
                .ok_or_else(|| EvalError::UnresolvedName { name: name.clone() }),
            Expr::Neg(inner) => {
                let value = self.eval(inner)?.as_f64()?;
                Ok(EvalValue::Float(-value))
            }
            Expr::Not(inner) => {
                let value = self.eval(inner)?;
                Ok(EvalValue::Bool(!value.is_truthy()))
            }
            Expr::Binary(op, lhs, rhs) => self.eval_binary(*op, lhs, rhs),
            Expr::Call(name, args) => self.eval_call(name, args),
        }
    }

    /// Evaluates an f-string's literal and interpolated parts, concatenating
    /// the result into a single string.
    fn eval_fstring(&self, parts: &[FStringPart]) -> Result<EvalValue, EvalError> {
        let mut out = String::new();
        for part in parts {
            match part {
                FStringPart::Literal(text) => out.push_str(text),
                FStringPart::Expr(expr) => {
                    let value = self.eval(expr)?;
                    if matches!(value, EvalValue::List(_)) {
                        return Err(EvalError::NotInterpolatable);
                    }
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(EvalValue::Str(out))
    }

    /// Evaluates a binary operator application, short-circuiting `and`/`or`.
    fn eval_binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<EvalValue, EvalError> {
        if matches!(op, BinaryOp::And) {
            let left = self.eval(lhs)?;
            if !left.is_truthy() {
                return Ok(EvalValue::Bool(false));
            }
            return Ok(EvalValue::Bool(self.eval(rhs)?.is_truthy()));
        }
        if matches!(op, BinaryOp::Or) {
            let left = self.eval(lhs)?;
            if left.is_truthy() {
                return Ok(EvalValue::Bool(true));
            }
            return Ok(EvalValue::Bool(self.eval(rhs)?.is_truthy()));
        }

        let left = self.eval(lhs)?;
        let right = self.eval(rhs)?;

        match op {
            BinaryOp::Eq => return Ok(EvalValue::Bool(values_equal(&left, &right))),
            BinaryOp::Ne => return Ok(EvalValue::Bool(!values_equal(&left, &right))),
            _ => {}
        }

        let a = left.as_f64()?;
        let b = right.as_f64()?;
        match op {
            BinaryOp::Add => Ok(EvalValue::Float(a + b)),
            BinaryOp::Sub => Ok(EvalValue::Float(a - b)),
            BinaryOp::Mul => Ok(EvalValue::Float(a * b)),
            BinaryOp::Div => {
                if b == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(EvalValue::Float(a / b))
            }
            BinaryOp::Pow => Ok(EvalValue::Float(a.powf(b))),
            BinaryOp::Lt => Ok(EvalValue::Bool(a < b)),
            BinaryOp::Le => Ok(EvalValue::Bool(a <= b)),
            BinaryOp::Gt => Ok(EvalValue::Bool(a > b)),
            BinaryOp::Ge => Ok(EvalValue::Bool(a >= b)),
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::And | BinaryOp::Or => unreachable!(
                "handled above"
            ),
        }
    }

    /// Evaluates a function call's arguments, then dispatches to the named
    /// distribution primitive under its own freshly derived RNG substream.
    fn eval_call(&self, name: &str, arg_exprs: &[Expr]) -> Result<EvalValue, EvalError> {
        let mut args = Vec::with_capacity(arg_exprs.len());
        for arg in arg_exprs {
            args.push(self.eval(arg)?);
        }
        if !is_distribution(name) {
            return Err(EvalError::UnknownFunction {
                name: name.to_owned(),
            });
        }
        let index = self.call_index.get();
        self.call_index.set(index + 1);
        let call_path = format!("{}#{index}", self.path);
        let mut rng = derive_rng(self.seed, &call_path);
        match name {
            "normal" => distributions::normal(&args, &mut rng),
            "lognormal" => distributions::lognormal(&args, &mut rng),
            "uniform" => distributions::uniform(&args, &mut rng),
            "poisson" => distributions::poisson(&args, &mut rng),
            "exponential" => distributions::exponential(&args, &mut rng),
            "discrete" => distributions::discrete(&args, &mut rng),
            "choice" => distributions::choice(&args, &mut rng),
            other => Err(EvalError::UnknownFunction {
                name: other.to_owned(),
            }),
        }
    }
}

/// Returns `true` if `name` is one of the closed set of distribution
/// primitives this interpreter can call.
fn is_distribution(name: &str) -> bool {
    matches!(
        name,
        "normal" | "lognormal" | "uniform" | "poisson" | "exponential" | "discrete" | "choice"
    )
}

/// Structural equality for `==`/`!=`, comparing numerically across
/// `Int`/`Float`/`Bool` and recursively for lists.
fn values_equal(a: &EvalValue, b: &EvalValue) -> bool {
    match (a, b) {
        (EvalValue::Null, EvalValue::Null) => true,
        (EvalValue::Bool(x), EvalValue::Bool(y)) => x == y,
        (EvalValue::Str(x), EvalValue::Str(y)) => x == y,
        (EvalValue::List(x), EvalValue::List(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| values_equal(l, r))
        }
        _ => a.as_f64().ok().zip(b.as_f64().ok()).is_some_and(|(x, y)| (x - y).abs() < f64::EPSILON),
    }
}
