// crates/xenospec-session/src/resolver.rs
// ============================================================================
// Module: XenoSpec Action Param Resolver
// Description: Bridges an action's JSON params into the evaluator's name
// resolution, for cost-formula evaluation.
// Purpose: Implements spec.md §4.8.2 step 4: "cost...evaluated with params
// in scope".
// Dependencies: serde_json, xenospec-eval
// ============================================================================

//! ## Overview
//! A cost formula is an ordinary evaluator-language expression (spec.md
//! §4.4's grammar), evaluated with the submitted action's params bound as
//! top-level names. [`ParamsResolver`] is the small adapter that makes an
//! `act()` call's `serde_json::Value` params visible to
//! [`xenospec_eval::evaluate`] through its [`xenospec_eval::NameResolver`]
//! seam.

use serde_json::Value;
use xenospec_eval::EvalValue;
use xenospec_eval::NameResolver;

/// Resolves a bare (non-dotted) name against an action's JSON params
/// object.
pub struct ParamsResolver<'a> {
    params: &'a Value,
}

impl<'a> ParamsResolver<'a> {
    /// Wraps `params` (an action's submitted parameters) for name
    /// resolution during cost-formula evaluation.
    #[must_use]
    pub fn new(params: &'a Value) -> Self {
        ParamsResolver { params }
    }
}

impl NameResolver for ParamsResolver<'_> {
    fn resolve(&self, dotted_name: &str) -> Option<EvalValue> {
        let field = self.params.as_object()?.get(dotted_name)?;
        json_to_eval_value(field)
    }
}

/// Converts a JSON value into an [`EvalValue`], for cost-formula params.
/// Objects have no `EvalValue` representation and resolve to `None`.
fn json_to_eval_value(value: &Value) -> Option<EvalValue> {
    match value {
        Value::Null => Some(EvalValue::Null),
        Value::Bool(b) => Some(EvalValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(EvalValue::Int(i))
            } else {
                n.as_f64().map(EvalValue::Float)
            }
        }
        Value::String(s) => Some(EvalValue::Str(s.clone())),
        Value::Array(items) => items.iter().map(json_to_eval_value).collect::<Option<Vec<_>>>().map(EvalValue::List),
        Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use xenospec_eval::EvalValue;
    use xenospec_eval::NameResolver;

    use super::ParamsResolver;

    #[test]
    fn resolves_a_top_level_param() {
        let params = json!({ "amount": 3.5, "label": "feedstock" });
        let resolver = ParamsResolver::new(&params);
        assert_eq!(resolver.resolve("amount"), Some(EvalValue::Float(3.5)));
        assert_eq!(
            resolver.resolve("label"),
            Some(EvalValue::Str("feedstock".to_owned()))
        );
        assert_eq!(resolver.resolve("missing"), None);
    }
}
