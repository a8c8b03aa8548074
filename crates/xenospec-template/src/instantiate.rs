// crates/xenospec-template/src/instantiate.rs
// ============================================================================
// Module: XenoSpec Template Instantiation
// Description: Expands an `_instantiate_:` block's `_as_ NAME:` entries into
// concrete, loaded, parameter-resolved template instances.
// Purpose: Implements spec.md §4.6's instancing semantics.
// Dependencies: indexmap, xenospec-eval, xenospec-yaml
// ============================================================================

//! ## Overview
//! This crate has no dependency on a fetch engine (its `Cargo.toml` does not
//! name `xenospec-fetch`), so `_template_: path` loading is mediated by the
//! caller-supplied [`TemplateLoader`] trait rather than a concrete fetch
//! call — the same dependency-inversion seam `xenospec-eval`'s
//! `NameResolver` uses to avoid depending on the scope graph.

use indexmap::IndexMap;
use xenospec_eval::EvalValue;
use xenospec_yaml::Node;

use crate::error::TemplateError;
use crate::loop_key;
use crate::params;
use crate::params::SiblingResolver;

/// Loads the raw tree a `_template_: path` directive names.
///
/// Implemented by a caller that has access to a fetch engine and reference
/// resolver (`xenospec-session`, `xenospec-experiment`, `xenospec-cli`);
/// this crate only consumes the trait.
pub trait TemplateLoader {
    /// Loads and fully resolves the template document at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError::TemplateLoad`] describing why the
    /// template could not be produced.
    fn load_template(&self, path: &str) -> Result<Node, TemplateError>;
}

/// One concrete, loaded, parameter-resolved instance produced by expanding
/// an `_as_` entry.
#[derive(Debug, Clone)]
pub struct ResolvedInstance {
    /// The instance's fully qualified name within its enclosing namespace.
    pub name: String,
    /// The template's own body, as loaded by the [`TemplateLoader`] (not
    /// yet recursively re-expanded — the orchestrating expander does that).
    pub template: Node,
    /// This instance's resolved `_params_:` bindings.
    pub params: IndexMap<String, EvalValue>,
}

/// Expands one `_as_` key/value pair from an `_instantiate_:` mapping into
/// its [`ResolvedInstance`] list.
///
/// `value_node` is expected to be a mapping containing a `_template_:`
/// string and, optionally, sibling keys treated as inline instantiation
/// overrides (spec.md §4.6: "inline instantiation args > parent override >
/// default").
///
/// # Errors
///
/// Returns [`TemplateError::InvalidIndexLoop`] if `key` is malformed,
/// [`TemplateError::TemplateLoad`] if `_template_:` is missing or fails to
/// load, or [`TemplateError::ParamEval`] if a declared parameter default
/// fails to evaluate.
pub fn expand_instantiate_entry(
    key: &str,
    value_node: &Node,
    loader: &dyn TemplateLoader,
    parent_overrides: &IndexMap<String, EvalValue>,
    seed: u64,
    path: &str,
) -> Result<Vec<ResolvedInstance>, TemplateError> {
    let as_key = loop_key::parse_as_key(key)?;

    let template_path = value_node
        .get("_template_")
        .and_then(Node::as_str)
        .ok_or_else(|| TemplateError::TemplateLoad {
            path: as_key.name.clone(),
            message: "`_instantiate_` entry is missing a `_template_:` path".to_owned(),
        })?;

    let inline_overrides = inline_overrides_from(value_node);

    let mut combined_for_range = parent_overrides.clone();
    combined_for_range.extend(inline_overrides.clone());
    let range_resolver = SiblingResolver(&combined_for_range);

    let instances = loop_key::expand_instances(&as_key, &range_resolver, seed, path)?;

    let mut resolved = Vec::with_capacity(instances.len());
    for instance in instances {
        let mut instance_overrides = inline_overrides.clone();
        if let Some(loop_var) = &as_key.loop_var {
            instance_overrides.insert(loop_var.clone(), instance.index_value);
        }

        let template = loader.load_template(template_path)?;
        let instance_path = format!("{path}.{}", instance.instance_name);
        let params = match template.get("_params_") {
            Some(declarations) => params::resolve_params(
                declarations,
                parent_overrides,
                &instance_overrides,
                seed,
                &instance_path,
            )?,
            None => instance_overrides,
        };

        resolved.push(ResolvedInstance {
            name: instance.instance_name,
            template,
            params,
        });
    }
    Ok(resolved)
}

/// Reads `value_node`'s mapping keys other than `_template_`, `_ports_`,
/// and `_modify_` as literal inline parameter overrides.
fn inline_overrides_from(value_node: &Node) -> IndexMap<String, EvalValue> {
    let mut overrides = IndexMap::new();
    let Some(mapping) = value_node.as_mapping() else {
        return overrides;
    };
    for (key, node) in mapping {
        if key == "_template_" || key == "_ports_" || key == "_modify_" {
            continue;
        }
        overrides.insert(key.clone(), params::node_to_eval_value(node));
    }
    overrides
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use xenospec_core::SourceId;
    use xenospec_yaml::load_str;

    /// A [`TemplateLoader`] stub returning a fixed body regardless of path.
    struct FixedLoader(Node);

    impl TemplateLoader for FixedLoader {
        fn load_template(&self, _path: &str) -> Result<Node, TemplateError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn single_instance_with_no_loop_resolves_inline_overrides() {
        let value = load_str(
            "_template_: molecules/water\ncount: 3\n",
            SourceId::from("<test>"),
        )
        .expect("load");
        let template = load_str("_params_:\n  count: 1\n", SourceId::from("<test>")).expect("load");
        let loader = FixedLoader(template);
        let instances = expand_instantiate_entry(
            "water",
            &value,
            &loader,
            &IndexMap::new(),
            0,
            "world",
        )
        .expect("expand");
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "water");
        assert_eq!(instances[0].params.get("count"), Some(&EvalValue::Int(3)));
    }

    #[test]
    fn ranged_instance_binds_loop_variable_into_params() {
        let value = load_str("_template_: molecules/water\n", SourceId::from("<test>")).expect("load");
        let template =
            load_str("_params_:\n  i: 0\n", SourceId::from("<test>")).expect("load");
        let loader = FixedLoader(template);
        let instances = expand_instantiate_entry(
            "water{i in 1..2}",
            &value,
            &loader,
            &IndexMap::new(),
            0,
            "world",
        )
        .expect("expand");
        let names: Vec<_> = instances.iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["water1", "water2"]);
        assert_eq!(instances[0].params.get("i"), Some(&EvalValue::Int(1)));
        assert_eq!(instances[1].params.get("i"), Some(&EvalValue::Int(2)));
    }

    #[test]
    fn missing_template_path_is_an_error() {
        let value = load_str("count: 1\n", SourceId::from("<test>")).expect("load");
        let loader = FixedLoader(load_str("x: 1\n", SourceId::from("<test>")).expect("load"));
        let err = expand_instantiate_entry("x", &value, &loader, &IndexMap::new(), 0, "world")
            .unwrap_err();
        assert!(matches!(err, TemplateError::TemplateLoad { .. }));
    }
}
