// crates/xenospec-template/src/modify.rs
// ============================================================================
// Module: XenoSpec Template Modify
// Description: Applies `_modify_:` post-hoc structural edits to an
// already-expanded subtree.
// Purpose: Implements spec.md §4.6's `_append_`/`_set_`/`_merge_` operations.
// Dependencies: xenospec-yaml
// ============================================================================

//! ## Overview
//! `_modify_:` entries are keyed by a dotted target path into the
//! already-expanded subtree and valued by a single-entry mapping naming the
//! operation: `_append_` (extend a list), `_set_` (overwrite a value), or
//! `_merge_` (deep-merge a mapping). Edits apply in declaration order.

use xenospec_yaml::Node;
use xenospec_yaml::NodeValue;

use crate::error::TemplateError;

/// Applies every entry of a `_modify_:` mapping to `target` in declaration
/// order.
///
/// # Errors
///
/// Returns [`TemplateError::UnknownModifyOp`] if an entry names an
/// operation other than `_append_`/`_set_`/`_merge_`, or
/// [`TemplateError::ModifyTargetNotFound`] if a dotted target path does not
/// resolve within `target`.
pub fn apply_modify(target: &mut Node, modify_node: &Node) -> Result<(), TemplateError> {
    let Some(mapping) = modify_node.as_mapping() else {
        return Ok(());
    };
    for (target_path, op_node) in mapping {
        let Some(op_mapping) = op_node.as_mapping() else {
            return Err(TemplateError::UnknownModifyOp {
                op: target_path.clone(),
            });
        };
        let Some((op, value)) = op_mapping.iter().next() else {
            return Err(TemplateError::UnknownModifyOp {
                op: target_path.clone(),
            });
        };
        apply_one(target, target_path, op, value)?;
    }
    Ok(())
}

/// Applies a single `_append_`/`_set_`/`_merge_` operation at `target_path`.
fn apply_one(
    target: &mut Node,
    target_path: &str,
    op: &str,
    value: &Node,
) -> Result<(), TemplateError> {
    let slot = navigate_mut(target, target_path)?;
    match op {
        "_set_" => {
            *slot = value.clone();
        }
        "_append_" => append(slot, value)?,
        "_merge_" => merge(slot, value)?,
        other => {
            return Err(TemplateError::UnknownModifyOp {
                op: other.to_owned(),
            })
        }
    }
    Ok(())
}

/// Walks a dotted path into `target`, returning a mutable reference to the
/// addressed node.
fn navigate_mut<'a>(target: &'a mut Node, path: &str) -> Result<&'a mut Node, TemplateError> {
    let mut current = target;
    for segment in path.split('.') {
        let NodeValue::Mapping(mapping) = &mut current.value else {
            return Err(TemplateError::ModifyTargetNotFound {
                path: path.to_owned(),
            });
        };
        current = mapping
            .get_mut(segment)
            .ok_or_else(|| TemplateError::ModifyTargetNotFound {
                path: path.to_owned(),
            })?;
    }
    Ok(current)
}

/// Extends a sequence node with `value`'s elements (if `value` is itself a
/// sequence) or pushes `value` as a single new element.
fn append(slot: &mut Node, value: &Node) -> Result<(), TemplateError> {
    let NodeValue::Sequence(items) = &mut slot.value else {
        return Err(TemplateError::UnknownModifyOp {
            op: "_append_ onto a non-list node".to_owned(),
        });
    };
    match &value.value {
        NodeValue::Sequence(extra) => items.extend(extra.iter().cloned()),
        _ => items.push(value.clone()),
    }
    Ok(())
}

/// Deep-merges `value` into `slot`: mapping keys in `value` override or
/// extend `slot`'s own, recursing into nested mappings; any other node
/// kind in `value` replaces `slot` wholesale, matching ordinary YAML
/// merge semantics.
fn merge(slot: &mut Node, value: &Node) -> Result<(), TemplateError> {
    let NodeValue::Mapping(incoming) = &value.value else {
        *slot = value.clone();
        return Ok(());
    };
    if !matches!(slot.value, NodeValue::Mapping(_)) {
        *slot = value.clone();
        return Ok(());
    }
    let NodeValue::Mapping(existing) = &mut slot.value else {
        return Ok(());
    };
    for (key, incoming_value) in incoming {
        match existing.get_mut(key) {
            Some(existing_value) => merge(existing_value, incoming_value)?,
            None => {
                existing.insert(key.clone(), incoming_value.clone());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use xenospec_core::SourceId;
    use xenospec_yaml::load_str;

    #[test]
    fn set_overwrites_a_leaf_value() {
        let mut target = load_str("a:\n  b: 1\n", SourceId::from("<test>")).expect("load");
        let modify = load_str("a.b:\n  _set_: 9\n", SourceId::from("<test>")).expect("load");
        apply_modify(&mut target, &modify).expect("modify");
        let b = target.get("a").and_then(|n| n.get("b")).expect("b");
        assert_eq!(
            b.value,
            NodeValue::Scalar(xenospec_yaml::Scalar::Int(9))
        );
    }

    #[test]
    fn append_extends_a_list() {
        let mut target = load_str("items:\n  - 1\n  - 2\n", SourceId::from("<test>")).expect("load");
        let modify = load_str("items:\n  _append_: 3\n", SourceId::from("<test>")).expect("load");
        apply_modify(&mut target, &modify).expect("modify");
        let items = target.get("items").and_then(Node::as_sequence).expect("seq");
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn merge_deep_merges_nested_mappings() {
        let mut target =
            load_str("config:\n  a: 1\n  nested:\n    x: 1\n", SourceId::from("<test>"))
                .expect("load");
        let modify = load_str(
            "config:\n  _merge_:\n    b: 2\n    nested:\n      y: 2\n",
            SourceId::from("<test>"),
        )
        .expect("load");
        apply_modify(&mut target, &modify).expect("modify");
        let config = target.get("config").expect("config");
        assert!(config.get("a").is_some());
        assert!(config.get("b").is_some());
        let nested = config.get("nested").expect("nested");
        assert!(nested.get("x").is_some());
        assert!(nested.get("y").is_some());
    }

    #[test]
    fn missing_target_path_is_an_error() {
        let mut target = load_str("a: 1\n", SourceId::from("<test>")).expect("load");
        let modify = load_str("missing.path:\n  _set_: 1\n", SourceId::from("<test>")).expect("load");
        let err = apply_modify(&mut target, &modify).unwrap_err();
        assert!(matches!(err, TemplateError::ModifyTargetNotFound { .. }));
    }
}
