// crates/xenospec-template/src/params.rs
// ============================================================================
// Module: XenoSpec Template Parameters
// Description: Resolves a `_params_:` declaration into a concrete value map.
// Purpose: Implements the `_params_:` override order from spec.md §4.6:
// "inline instantiation args > parent override > default".
// Dependencies: indexmap, xenospec-eval, xenospec-yaml
// ============================================================================

//! ## Overview
//! Parameter defaults may be literal YAML values or `!ev` expressions.
//! Defaults are evaluated in declaration order so that a later default may
//! reference an earlier parameter by name (the same left-to-right rule used
//! elsewhere in this codebase for sibling visibility).

use indexmap::IndexMap;
use xenospec_eval::EvalValue;
use xenospec_eval::NameResolver;
use xenospec_yaml::Node;
use xenospec_yaml::NodeValue;
use xenospec_yaml::Scalar;
use xenospec_yaml::TagValue;

use crate::error::TemplateError;

/// Resolves a `_params_:` body against parent and inline overrides,
/// producing the final parameter bindings for one template instantiation.
///
/// # Errors
///
/// Returns [`TemplateError::ParamEval`] if a default expression fails to
/// evaluate.
pub fn resolve_params(
    declarations: &Node,
    parent_overrides: &IndexMap<String, EvalValue>,
    inline_overrides: &IndexMap<String, EvalValue>,
    seed: u64,
    path: &str,
) -> Result<IndexMap<String, EvalValue>, TemplateError> {
    let mut resolved = IndexMap::new();
    let Some(mapping) = declarations.as_mapping() else {
        return Ok(resolved);
    };

    for (name, default_node) in mapping {
        let value = if let Some(value) = inline_overrides.get(name) {
            value.clone()
        } else if let Some(value) = parent_overrides.get(name) {
            value.clone()
        } else {
            evaluate_default(default_node, &resolved, seed, path, name)?
        };
        resolved.insert(name.clone(), value);
    }

    Ok(resolved)
}

/// Evaluates a single parameter's default: a literal is converted directly,
/// an `!ev` expression is evaluated against the parameters already resolved
/// earlier in this same declaration.
fn evaluate_default(
    default_node: &Node,
    already_resolved: &IndexMap<String, EvalValue>,
    seed: u64,
    path: &str,
    name: &str,
) -> Result<EvalValue, TemplateError> {
    if let NodeValue::Tag(tag) = &default_node.value {
        if let TagValue::Evaluable(source) = tag.as_ref() {
            let resolver = SiblingResolver(already_resolved);
            let call_path = format!("{path}.{name}");
            return xenospec_eval::evaluate_str(source, &resolver, seed, &call_path)
                .map_err(|source| TemplateError::ParamEval {
                    name: name.to_owned(),
                    source,
                });
        }
    }
    Ok(node_to_eval_value(default_node))
}

/// Resolves a dotted name against already-resolved sibling parameters.
pub(crate) struct SiblingResolver<'a>(pub(crate) &'a IndexMap<String, EvalValue>);

impl NameResolver for SiblingResolver<'_> {
    fn resolve(&self, dotted_name: &str) -> Option<EvalValue> {
        self.0.get(dotted_name).cloned()
    }
}

/// Converts a literal YAML node into an [`EvalValue`]. Mappings have no
/// `EvalValue` representation and become [`EvalValue::Null`]: a `_params_:`
/// default is expected to be a scalar, a list of scalars, or an `!ev`
/// expression.
pub(crate) fn node_to_eval_value(node: &Node) -> EvalValue {
    match &node.value {
        NodeValue::Scalar(Scalar::Null) => EvalValue::Null,
        NodeValue::Scalar(Scalar::Bool(b)) => EvalValue::Bool(*b),
        NodeValue::Scalar(Scalar::Int(i)) => EvalValue::Int(*i),
        NodeValue::Scalar(Scalar::Float(f)) => EvalValue::Float(*f),
        NodeValue::Scalar(Scalar::String(s)) => EvalValue::Str(s.clone()),
        NodeValue::Sequence(items) => EvalValue::List(items.iter().map(node_to_eval_value).collect()),
        NodeValue::Mapping(_) | NodeValue::Tag(_) => EvalValue::Null,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use xenospec_core::SourceId;
    use xenospec_yaml::load_str;

    #[test]
    fn inline_override_wins_over_default() {
        let declarations = load_str("count: 1\n", SourceId::from("<test>")).expect("load");
        let mut inline = IndexMap::new();
        inline.insert("count".to_owned(), EvalValue::Int(9));
        let resolved = resolve_params(&declarations, &IndexMap::new(), &inline, 0, "x")
            .expect("resolve");
        assert_eq!(resolved.get("count"), Some(&EvalValue::Int(9)));
    }

    #[test]
    fn parent_override_wins_over_default_when_no_inline() {
        let declarations = load_str("count: 1\n", SourceId::from("<test>")).expect("load");
        let mut parent = IndexMap::new();
        parent.insert("count".to_owned(), EvalValue::Int(5));
        let resolved = resolve_params(&declarations, &parent, &IndexMap::new(), 0, "x")
            .expect("resolve");
        assert_eq!(resolved.get("count"), Some(&EvalValue::Int(5)));
    }

    #[test]
    fn falls_back_to_literal_default() {
        let declarations = load_str("count: 3\n", SourceId::from("<test>")).expect("load");
        let resolved =
            resolve_params(&declarations, &IndexMap::new(), &IndexMap::new(), 0, "x").expect("resolve");
        assert_eq!(resolved.get("count"), Some(&EvalValue::Int(3)));
    }

    #[test]
    fn evaluable_default_sees_earlier_sibling_params() {
        let declarations = load_str("base: 2\ndoubled: !ev \"base * 2\"\n", SourceId::from("<test>"))
            .expect("load");
        let resolved =
            resolve_params(&declarations, &IndexMap::new(), &IndexMap::new(), 0, "x").expect("resolve");
        assert_eq!(resolved.get("doubled"), Some(&EvalValue::Float(4.0)));
    }
}
