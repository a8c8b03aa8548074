// crates/xenospec-eval/src/distributions.rs
// ============================================================================
// Module: XenoSpec Eval Distributions
// Description: The closed set of named sampling primitives callable from
// `!ev` expressions.
// Purpose: Implement `normal`, `lognormal`, `uniform`, `poisson`,
// `exponential`, `discrete`, and `choice` over a per-call RNG substream
// (spec.md §4.4).
// Dependencies: rand, rand_distr
// ============================================================================

//! ## Overview
//! Each function takes its already-evaluated [`EvalValue`] arguments and a
//! mutable RNG substream (see [`crate::rng::derive_rng`]) and returns a
//! single [`EvalValue`]. Return-type conventions, per spec.md §4.4:
//!
//! - `normal`, `lognormal`, `uniform`, `exponential` → `Float`
//! - `poisson` → `Int`
//! - `discrete`, `choice` → the original element's value, type preserved

use rand::Rng;
use rand_distr::Distribution;
use rand_distr::Exp;
use rand_distr::LogNormal;
use rand_distr::Normal;
use rand_distr::Poisson;

use crate::error::EvalError;
use crate::value::EvalValue;

/// Checks that `args` has exactly `expected` elements, raising
/// [`EvalError::ArityMismatch`] otherwise.
fn expect_args(name: &'static str, args: &[EvalValue], expected: usize) -> Result<(), EvalError> {
    if args.len() != expected {
        return Err(EvalError::ArityMismatch {
            name: name.to_owned(),
            expected: match expected {
                1 => "1",
                2 => "2",
                _ => "a fixed number of",
            },
            found: args.len(),
        });
    }
    Ok(())
}

/// `normal(mean, stddev)` — a Gaussian draw.
///
/// # Errors
///
/// Returns [`EvalError::ArityMismatch`] or [`EvalError::NotNumeric`] on bad
/// arguments, or propagates a construction failure from `rand_distr` as
/// [`EvalError::NotNumeric`] (a non-positive `stddev`).
pub fn normal(args: &[EvalValue], rng: &mut impl Rng) -> Result<EvalValue, EvalError> {
    expect_args("normal", args, 2)?;
    let mean = args[0].as_f64()?;
    let stddev = args[1].as_f64()?;
    let dist = Normal::new(mean, stddev).map_err(|_| EvalError::NotNumeric { found: "float" })?;
    Ok(EvalValue::Float(dist.sample(rng)))
}

/// `lognormal(mu, sigma)` — a log-normal draw.
///
/// # Errors
///
/// See [`normal`].
pub fn lognormal(args: &[EvalValue], rng: &mut impl Rng) -> Result<EvalValue, EvalError> {
    expect_args("lognormal", args, 2)?;
    let mu = args[0].as_f64()?;
    let sigma = args[1].as_f64()?;
    let dist = LogNormal::new(mu, sigma).map_err(|_| EvalError::NotNumeric { found: "float" })?;
    Ok(EvalValue::Float(dist.sample(rng)))
}

/// `uniform(low, high)` — a uniform draw over `[low, high)`.
///
/// # Errors
///
/// Returns [`EvalError::ArityMismatch`] or [`EvalError::NotNumeric`] on bad
/// arguments.
pub fn uniform(args: &[EvalValue], rng: &mut impl Rng) -> Result<EvalValue, EvalError> {
    expect_args("uniform", args, 2)?;
    let low = args[0].as_f64()?;
    let high = args[1].as_f64()?;
    if !(low < high) {
        return Ok(EvalValue::Float(low));
    }
    Ok(EvalValue::Float(rng.gen_range(low..high)))
}

/// `poisson(lambda)` — a Poisson draw, returned as `Int`.
///
/// # Errors
///
/// Returns [`EvalError::ArityMismatch`] or [`EvalError::NotNumeric`] on bad
/// arguments, including a non-positive `lambda`.
pub fn poisson(args: &[EvalValue], rng: &mut impl Rng) -> Result<EvalValue, EvalError> {
    expect_args("poisson", args, 1)?;
    let lambda = args[0].as_f64()?;
    let dist = Poisson::new(lambda).map_err(|_| EvalError::NotNumeric { found: "float" })?;
    let draw: f64 = dist.sample(rng);
    #[allow(
        clippy::cast_possible_truncation,
        reason = "poisson draws are rounded first and returned as Int by convention"
    )]
    let rounded = draw.round() as i64;
    Ok(EvalValue::Int(rounded))
}

/// `exponential(rate)` — an exponential draw.
///
/// # Errors
///
/// Returns [`EvalError::ArityMismatch`] or [`EvalError::NotNumeric`] on bad
/// arguments, including a non-positive `rate`.
pub fn exponential(args: &[EvalValue], rng: &mut impl Rng) -> Result<EvalValue, EvalError> {
    expect_args("exponential", args, 1)?;
    let rate = args[0].as_f64()?;
    let dist = Exp::new(rate).map_err(|_| EvalError::NotNumeric { found: "float" })?;
    Ok(EvalValue::Float(dist.sample(rng)))
}

/// `discrete(values, weights)` — picks one element of `values`, weighted by
/// the matching entry in `weights`. Weights that do not sum to `1` are
/// normalized; a weight vector summing to zero is a [`EvalError::DiscreteZeroWeight`]
/// error (decided in the project's open-question ledger).
///
/// # Errors
///
/// Returns [`EvalError::ArityMismatch`], [`EvalError::DiscreteLengthMismatch`],
/// or [`EvalError::DiscreteZeroWeight`].
pub fn discrete(args: &[EvalValue], rng: &mut impl Rng) -> Result<EvalValue, EvalError> {
    expect_args("discrete", args, 2)?;
    let values = match &args[0] {
        EvalValue::List(items) => items.clone(),
        other => vec![other.clone()],
    };
    let weights_raw = match &args[1] {
        EvalValue::List(items) => items.clone(),
        other => vec![other.clone()],
    };
    if values.len() != weights_raw.len() {
        return Err(EvalError::DiscreteLengthMismatch {
            values: values.len(),
            weights: weights_raw.len(),
        });
    }
    let mut weights = Vec::with_capacity(weights_raw.len());
    for weight in &weights_raw {
        weights.push(weight.as_f64()?);
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(EvalError::DiscreteZeroWeight);
    }
    let mut pick = rng.gen_range(0.0..total);
    for (value, weight) in values.iter().zip(weights.iter()) {
        if pick < *weight {
            return Ok(value.clone());
        }
        pick -= *weight;
    }
    Ok(values[values.len() - 1].clone())
}

/// `choice(options...)` — picks one argument uniformly at random, preserving
/// its original type.
///
/// # Errors
///
/// Returns [`EvalError::EmptyChoice`] if called with no arguments.
pub fn choice(args: &[EvalValue], rng: &mut impl Rng) -> Result<EvalValue, EvalError> {
    if args.is_empty() {
        return Err(EvalError::EmptyChoice);
    }
    let index = rng.gen_range(0..args.len());
    Ok(args[index].clone())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use crate::rng::derive_rng;

    #[test]
    fn poisson_returns_int() {
        let mut rng = derive_rng(1, "x");
        let value = poisson(&[EvalValue::Float(3.0)], &mut rng).expect("poisson");
        assert!(matches!(value, EvalValue::Int(_)));
    }

    #[test]
    fn discrete_respects_weights_deterministically() {
        let mut rng = derive_rng(42, "world.choice");
        let values = EvalValue::List(vec![EvalValue::Str("a".into()), EvalValue::Str("b".into())]);
        let weights = EvalValue::List(vec![EvalValue::Float(1.0), EvalValue::Float(0.0)]);
        let value = discrete(&[values, weights], &mut rng).expect("discrete");
        assert_eq!(value, EvalValue::Str("a".into()));
    }

    #[test]
    fn discrete_rejects_zero_total_weight() {
        let mut rng = derive_rng(1, "x");
        let values = EvalValue::List(vec![EvalValue::Int(1), EvalValue::Int(2)]);
        let weights = EvalValue::List(vec![EvalValue::Float(0.0), EvalValue::Float(0.0)]);
        let err = discrete(&[values, weights], &mut rng).unwrap_err();
        assert!(matches!(err, EvalError::DiscreteZeroWeight));
    }

    #[test]
    fn choice_is_deterministic_for_a_fixed_seed() {
        let mut rng_a = derive_rng(5, "world.pick");
        let mut rng_b = derive_rng(5, "world.pick");
        let options = vec![EvalValue::Int(1), EvalValue::Int(2), EvalValue::Int(3)];
        assert_eq!(
            choice(&options, &mut rng_a).expect("choice"),
            choice(&options, &mut rng_b).expect("choice"),
        );
    }

    #[test]
    fn choice_rejects_empty_options() {
        let mut rng = derive_rng(1, "x");
        let err = choice(&[], &mut rng).unwrap_err();
        assert!(matches!(err, EvalError::EmptyChoice));
    }
}
