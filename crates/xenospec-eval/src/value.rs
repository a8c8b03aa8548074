// crates/xenospec-eval/src/value.rs
// ============================================================================
// Module: XenoSpec Eval Value
// Description: The runtime value type produced by evaluating a deferred
// (`!ev`) expression.
// Purpose: Give the evaluator, the name resolver, and downstream consumers
// (template expansion, hydration) a single small value type to agree on.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`EvalValue`] is intentionally small: the evaluator's primitives (§4.4)
//! only ever produce null, booleans, numbers, strings, or lists of the same.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::EvalError;

/// A value produced by evaluating a deferred expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalValue {
    /// `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A string, possibly the result of f-string interpolation.
    Str(String),
    /// An ordered list of values, produced by `discrete`'s `values` argument
    /// or arithmetic over lists is not supported — lists only ever flow
    /// through as opaque argument data.
    List(Vec<EvalValue>),
}

impl EvalValue {
    /// Returns this value's numeric representation as `f64`, coercing
    /// `Int` and `Bool`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::NotNumeric`] for strings, lists, and null.
    pub fn as_f64(&self) -> Result<f64, EvalError> {
        match self {
            Self::Int(i) => Ok(*i as f64),
            Self::Float(f) => Ok(*f),
            Self::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(EvalError::NotNumeric {
                found: other.type_name(),
            }),
        }
    }

    /// Returns this value rounded to the nearest `i64`, for "integer
    /// context" consumers such as index-loop bounds (spec.md §4.4: "Where a
    /// distribution is used in an integer context, result is rounded to
    /// nearest integer").
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::NotNumeric`] for non-numeric values.
    pub fn round_to_i64(&self) -> Result<i64, EvalError> {
        match self {
            Self::Int(i) => Ok(*i),
            _ => {
                let value = self.as_f64()?;
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "value is rounded first; integer-context callers want truncation here"
                )]
                let rounded = value.round() as i64;
                Ok(rounded)
            }
        }
    }

    /// Returns this value's truthiness for `and`/`or`/`not` and conditional
    /// consumers: `false`/`null`/`0`/`""` are falsy, everything else truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
        }
    }

    /// Returns a short type name for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for EvalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for EvalValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for EvalValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for EvalValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for EvalValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}
