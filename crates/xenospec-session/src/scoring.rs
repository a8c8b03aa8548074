// crates/xenospec-session/src/scoring.rs
// ============================================================================
// Module: XenoSpec Scoring & Termination Expressions
// Description: A tree-walking evaluator for the Quoted (`!_`) expressions a
// scenario uses for its termination condition and scoring functions.
// Purpose: Implements spec.md §4.8.3 condition 5 and §4.8.4's "scope that
// exposes trace, population(species), budget_exceeded(), and other
// registered helpers".
// Dependencies: xenospec-eval
// ============================================================================

//! ## Overview
//! `Quoted` (`!_`) strings are never evaluated by the evaluator crate itself
//! (spec.md §3: "meaningful only to a downstream consumer"); a session is
//! exactly that consumer for termination and scoring expressions. This
//! module reuses [`xenospec_eval::parse`] and its [`xenospec_eval::Expr`]/
//! [`xenospec_eval::BinaryOp`] AST — the grammar is identical — but supplies
//! its own call dispatch: instead of the distribution primitives, scoring
//! expressions call `population(species)` and `budget_exceeded()`, and
//! resolve dotted names against a small fixed set of trace aggregates
//! (`trace.length`, `trace.total_cost`) in addition to whatever the
//! scenario itself binds.

use xenospec_eval::BinaryOp;
use xenospec_eval::EvalError;
use xenospec_eval::EvalValue;
use xenospec_eval::Expr;
use xenospec_eval::FStringPart;

use crate::error::SessionError;
use crate::timeline::Timeline;

/// Resolves a plain (non-helper-call) dotted name against whatever scope a
/// scoring or termination expression is evaluated in. Scenario-defined
/// names (e.g. bound constants from the hydrated scenario body) flow
/// through an implementation of this trait.
pub trait ScoringResolver {
    /// Looks up `dotted_name`, returning `None` if it is unbound.
    fn resolve(&self, dotted_name: &str) -> Option<EvalValue>;
}

/// A [`ScoringResolver`] with no bindings beyond the trace/population/
/// budget helpers every scoring scope exposes.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyScoringResolver;

impl ScoringResolver for EmptyScoringResolver {
    fn resolve(&self, _dotted_name: &str) -> Option<EvalValue> {
        None
    }
}

/// Everything a scoring or termination expression may read: the trace
/// aggregates, the simulator's population query, and the current cost
/// ledger against the active budget.
pub struct ScoringScope<'a> {
    /// The session's timeline, for `trace.*` aggregates.
    pub timeline: &'a Timeline,
    /// Queries a named population, for the `population(species)` helper.
    pub population: &'a dyn Fn(&str) -> Option<f64>,
    /// The cost spent so far.
    pub spent: f64,
    /// The active budget ceiling, if any.
    pub budget: Option<f64>,
    /// Scenario-bound names beyond the builtin helpers.
    pub resolver: &'a dyn ScoringResolver,
}

/// Parses and evaluates `source` against `scope`.
///
/// # Errors
///
/// Returns [`SessionError::ExpressionParse`] if `source` fails to parse, or
/// [`SessionError::ExpressionEval`] if evaluation fails (unresolved name,
/// wrong helper arity, non-numeric operand, etc).
pub fn evaluate(source: &str, scope: &ScoringScope<'_>) -> Result<EvalValue, SessionError> {
    let expr = xenospec_eval::parse(source).map_err(|err| SessionError::ExpressionParse {
        source_text: source.to_owned(),
        source: err,
    })?;
    eval(&expr, scope).map_err(|err| SessionError::ExpressionEval {
        source_text: source.to_owned(),
        source: err,
    })
}

/// Evaluates a single AST node, recursing into its children.
fn eval(expr: &Expr, scope: &ScoringScope<'_>) -> Result<EvalValue, EvalError> {
    match expr {
        Expr::Null => Ok(EvalValue::Null),
        Expr::Bool(b) => Ok(EvalValue::Bool(*b)),
        Expr::Int(i) => Ok(EvalValue::Int(*i)),
        Expr::Float(f) => Ok(EvalValue::Float(*f)),
        Expr::Str(s) => Ok(EvalValue::Str(s.clone())),
        Expr::FString(parts) => eval_fstring(parts, scope),
        Expr::Name(name) => resolve_name(name, scope),
        Expr::Neg(inner) => Ok(EvalValue::Float(-eval(inner, scope)?.as_f64()?)),
        Expr::Not(inner) => Ok(EvalValue::Bool(!eval(inner, scope)?.is_truthy())),
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs, scope),
        Expr::Call(name, args) => eval_call(name, args, scope),
    }
}

/// Evaluates an f-string's literal and interpolated parts.
fn eval_fstring(parts: &[FStringPart], scope: &ScoringScope<'_>) -> Result<EvalValue, EvalError> {
    let mut out = String::new();
    for part in parts {
        match part {
            FStringPart::Literal(text) => out.push_str(text),
            FStringPart::Expr(expr) => {
                let value = eval(expr, scope)?;
                if matches!(value, EvalValue::List(_)) {
                    return Err(EvalError::NotInterpolatable);
                }
                out.push_str(&value.to_string());
            }
        }
    }
    Ok(EvalValue::Str(out))
}

/// Resolves a dotted name: first the builtin `trace.*` aggregates, then
/// `scope.resolver`.
fn resolve_name(name: &str, scope: &ScoringScope<'_>) -> Result<EvalValue, EvalError> {
    if let Some(value) = resolve_trace_aggregate(name, scope.timeline) {
        return Ok(value);
    }
    scope
        .resolver
        .resolve(name)
        .ok_or_else(|| EvalError::UnresolvedName {
            name: name.to_owned(),
        })
}

/// The fixed set of `trace.*` aggregates a scoring scope exposes.
fn resolve_trace_aggregate(name: &str, timeline: &Timeline) -> Option<EvalValue> {
    match name {
        "trace.length" => Some(EvalValue::Int(i64_len(timeline.events().len()))),
        "trace.total_cost" => Some(EvalValue::Float(timeline.total_cost())),
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_wrap,
    reason = "trace lengths never approach i64::MAX in a single session"
)]
fn i64_len(len: usize) -> i64 {
    len as i64
}

/// Evaluates a binary operator application, short-circuiting `and`/`or`.
fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    scope: &ScoringScope<'_>,
) -> Result<EvalValue, EvalError> {
    if matches!(op, BinaryOp::And) {
        let left = eval(lhs, scope)?;
        if !left.is_truthy() {
            return Ok(EvalValue::Bool(false));
        }
        return Ok(EvalValue::Bool(eval(rhs, scope)?.is_truthy()));
    }
    if matches!(op, BinaryOp::Or) {
        let left = eval(lhs, scope)?;
        if left.is_truthy() {
            return Ok(EvalValue::Bool(true));
        }
        return Ok(EvalValue::Bool(eval(rhs, scope)?.is_truthy()));
    }

    let left = eval(lhs, scope)?;
    let right = eval(rhs, scope)?;

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
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::And | BinaryOp::Or => {
            unreachable!("handled above")
        }
    }
}

/// Evaluates a function call: `population`/`budget_exceeded`, the only two
/// helpers a scoring scope registers beyond plain name resolution.
fn eval_call(
    name: &str,
    arg_exprs: &[Expr],
    scope: &ScoringScope<'_>,
) -> Result<EvalValue, EvalError> {
    let mut args = Vec::with_capacity(arg_exprs.len());
    for arg in arg_exprs {
        args.push(eval(arg, scope)?);
    }
    match name {
        "population" => {
            let [EvalValue::Str(species)] = args.as_slice() else {
                return Err(EvalError::ArityMismatch {
                    name: "population".to_owned(),
                    expected: "1 string",
                    found: args.len(),
                });
            };
            let value = (scope.population)(species).unwrap_or(0.0);
            Ok(EvalValue::Float(value))
        }
        "budget_exceeded" => {
            if !args.is_empty() {
                return Err(EvalError::ArityMismatch {
                    name: "budget_exceeded".to_owned(),
                    expected: "0",
                    found: args.len(),
                });
            }
            let exceeded = scope.budget.is_some_and(|budget| scope.spent >= budget);
            Ok(EvalValue::Bool(exceeded))
        }
        other => Err(EvalError::UnknownFunction {
            name: other.to_owned(),
        }),
    }
}

/// Structural equality for `==`/`!=`, matching the evaluator crate's own
/// semantics so `0 == 0.0` and `"a" == "a"` both hold.
fn values_equal(a: &EvalValue, b: &EvalValue) -> bool {
    match (a, b) {
        (EvalValue::Null, EvalValue::Null) => true,
        (EvalValue::Bool(x), EvalValue::Bool(y)) => x == y,
        (EvalValue::Str(x), EvalValue::Str(y)) => x == y,
        (EvalValue::List(x), EvalValue::List(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| values_equal(l, r))
        }
        _ => a
            .as_f64()
            .ok()
            .zip(b.as_f64().ok())
            .is_some_and(|(x, y)| (x - y).abs() < f64::EPSILON),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use xenospec_eval::EvalValue;

    use super::EmptyScoringResolver;
    use super::ScoringScope;
    use crate::timeline::Timeline;

    #[test]
    fn budget_exceeded_reflects_spent_versus_budget() {
        let timeline = Timeline::new();
        let population = |_species: &str| None;
        let scope = ScoringScope {
            timeline: &timeline,
            population: &population,
            spent: 2.0,
            budget: Some(1.5),
            resolver: &EmptyScoringResolver,
        };
        let value = super::evaluate("budget_exceeded()", &scope).expect("eval");
        assert_eq!(value, EvalValue::Bool(true));
    }

    #[test]
    fn population_helper_queries_the_simulator() {
        let timeline = Timeline::new();
        let population = |species: &str| if species == "algae" { Some(42.0) } else { None };
        let scope = ScoringScope {
            timeline: &timeline,
            population: &population,
            spent: 0.0,
            budget: None,
            resolver: &EmptyScoringResolver,
        };
        let value = super::evaluate("population(\"algae\") > 10", &scope).expect("eval");
        assert_eq!(value, EvalValue::Bool(true));
    }

    #[test]
    fn unresolved_name_is_an_error() {
        let timeline = Timeline::new();
        let population = |_species: &str| None;
        let scope = ScoringScope {
            timeline: &timeline,
            population: &population,
            spent: 0.0,
            budget: None,
            resolver: &EmptyScoringResolver,
        };
        assert!(super::evaluate("unbound_name", &scope).is_err());
    }
}
