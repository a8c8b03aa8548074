// crates/xenospec-template/src/loop_key.rs
// ============================================================================
// Module: XenoSpec Template Loop Keys
// Description: Parses `_as_ NAME:` and `_as_ NAME{i in RANGE}:` instantiation
// keys.
// Purpose: Implements spec.md §4.6's index-loop key syntax.
// Dependencies: xenospec-eval, xenospec-yaml
// ============================================================================

//! ## Overview
//! Three forms of `_as_` key are recognized:
//!
//! - `_as_ NAME:` — a single instance, no loop.
//! - `_as_ NAME{i in a..b}:` / `_as_ NAME{i in a..<b}:` — an inclusive or
//!   exclusive numeric range, whose bounds are themselves `!ev`-expression
//!   syntax (so `n-1` or a parameter name is valid).
//! - `_as_ NAME{i in values}:` — iterates a named list parameter.
//!
//! Instance names concatenate the loop variable's value without a
//! separator (`NAME1`, `NAME2`, …) — dots are reserved for hierarchy
//! (spec.md §4.6).

use xenospec_eval::EvalValue;
use xenospec_eval::NameResolver;

use crate::error::TemplateError;

/// A parsed `_as_` instantiation key.
#[derive(Debug, Clone, PartialEq)]
pub struct AsKey {
    /// The namespace prefix instances are named under.
    pub name: String,
    /// The loop variable's name, if this key declares a loop (`None` for a
    /// plain `_as_ NAME:` with no `{i in ...}` clause).
    pub loop_var: Option<String>,
    /// The loop's source text (everything between `{` and `}`, minus the
    /// `VAR in ` prefix), unparsed until a resolver is available to
    /// evaluate range bounds.
    pub range_source: Option<String>,
}

/// One resolved iteration of a loop: the instance's concatenated name and
/// the loop variable's bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// The instance's fully qualified name, e.g. `"molecule1"`.
    pub instance_name: String,
    /// The loop variable's value for this iteration, bound into the
    /// instance's parameter overrides under `loop_var`'s name.
    pub index_value: EvalValue,
}

/// Parses an `_as_` key's text (the part after the literal `_as_ ` prefix
/// has already been stripped by the caller) into name and loop-range parts.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidIndexLoop`] if a `{...}` clause is
/// present but malformed.
pub fn parse_as_key(key: &str) -> Result<AsKey, TemplateError> {
    let Some(brace_start) = key.find('{') else {
        return Ok(AsKey {
            name: key.trim().to_owned(),
            loop_var: None,
            range_source: None,
        });
    };
    let name = key[..brace_start].trim().to_owned();
    let Some(brace_end) = key.rfind('}') else {
        return Err(TemplateError::InvalidIndexLoop {
            key: key.to_owned(),
            message: "unterminated `{` in loop key".to_owned(),
        });
    };
    let inner = &key[brace_start + 1..brace_end];
    let Some((var, range)) = inner.split_once(" in ") else {
        return Err(TemplateError::InvalidIndexLoop {
            key: key.to_owned(),
            message: "expected `VAR in RANGE` inside `{...}`".to_owned(),
        });
    };
    Ok(AsKey {
        name,
        loop_var: Some(var.trim().to_owned()),
        range_source: Some(range.trim().to_owned()),
    })
}

/// Expands an [`AsKey`] into its concrete [`Instance`] list.
///
/// A key with no loop clause produces exactly one instance, named `name`
/// with no index value. A numeric range produces one instance per integer
/// in range, named `"{name}{i}"`. A bare dotted name iterates a resolvable
/// list value.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidIndexLoop`] if the range expression
/// fails to evaluate or does not resolve to a range or list.
pub fn expand_instances(
    key: &AsKey,
    resolver: &dyn NameResolver,
    seed: u64,
    path: &str,
) -> Result<Vec<Instance>, TemplateError> {
    let Some(range_source) = &key.range_source else {
        return Ok(vec![Instance {
            instance_name: key.name.clone(),
            index_value: EvalValue::Null,
        }]);
    };

    if let Some((lower, upper, inclusive)) = split_range(range_source) {
        let lower_value = eval_bound(lower, resolver, seed, path)?;
        let upper_value = eval_bound(upper, resolver, seed, path)?;
        let end = if inclusive {
            upper_value + 1
        } else {
            upper_value
        };
        let mut instances = Vec::new();
        for i in lower_value..end {
            instances.push(Instance {
                instance_name: format!("{}{i}", key.name),
                index_value: EvalValue::Int(i),
            });
        }
        return Ok(instances);
    }

    let list_value = xenospec_eval::evaluate_str(range_source, resolver, seed, path).map_err(
        |source| TemplateError::InvalidIndexLoop {
            key: range_source.clone(),
            message: source.to_string(),
        },
    )?;
    let EvalValue::List(items) = list_value else {
        return Err(TemplateError::InvalidIndexLoop {
            key: range_source.clone(),
            message: "loop range is neither a numeric range nor a list".to_owned(),
        });
    };
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(i, value)| Instance {
            instance_name: format!("{}{i}", key.name),
            index_value: value,
        })
        .collect())
}

/// Splits `"a..b"` or `"a..<b"` into `(lower, upper, inclusive)`, returning
/// `None` if `source` contains no `..`.
fn split_range(source: &str) -> Option<(&str, &str, bool)> {
    if let Some((lower, upper)) = source.split_once("..<") {
        return Some((lower.trim(), upper.trim(), false));
    }
    let (lower, upper) = source.split_once("..")?;
    Some((lower.trim(), upper.trim(), true))
}

/// Evaluates a range bound expression and rounds it to an integer context
/// value, per spec.md §4.4.
fn eval_bound(
    source: &str,
    resolver: &dyn NameResolver,
    seed: u64,
    path: &str,
) -> Result<i64, TemplateError> {
    let value = xenospec_eval::evaluate_str(source, resolver, seed, path).map_err(|eval_err| {
        TemplateError::InvalidIndexLoop {
            key: source.to_owned(),
            message: format!("range bound failed to evaluate: {eval_err}"),
        }
    })?;
    value.round_to_i64().map_err(|_| TemplateError::InvalidIndexLoop {
        key: source.to_owned(),
        message: "range bound is not numeric".to_owned(),
    })
}
