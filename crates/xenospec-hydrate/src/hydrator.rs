// crates/xenospec-hydrate/src/hydrator.rs
// ============================================================================
// Module: XenoSpec Hydrator
// Description: Bottom-up hydration of typed elements into entities.
// Purpose: Implements spec.md §4.5's hydration algorithm over an already
// reference-resolved, scoped [`Node`] tree.
// Dependencies: indexmap, xenospec-scope, xenospec-yaml
// ============================================================================

//! ## Overview
//! [`hydrate`] mirrors the same mapping-walk [`xenospec_scope::ScopeGraph`]
//! performed when it built the scope tree, so that each typed element's
//! body node lines up with the [`xenospec_scope::ScopeId`] that scope
//! construction allocated for it.
//!
//! Hydration is bottom-up: nested typed elements are hydrated before the
//! element that contains them, per spec.md §4.5 step 3 ("it may itself
//! contain nested typed elements, which must already be hydrated").
//!
//! An unregistered type tag is not an error (spec.md: "typed-element syntax
//! is opt-in"); its own nested typed elements are still hydrated, and — since
//! there is no [`crate::Entity`] for the unregistered element to hold them —
//! they are promoted to the enclosing scope's result map instead of being
//! silently dropped.

use indexmap::IndexMap;
use xenospec_scope::Binding;
use xenospec_scope::ScopeGraph;
use xenospec_scope::ScopeId;
use xenospec_yaml::Node;

use crate::entity::Entity;
use crate::error::HydrateError;
use crate::registry::ConstructorContext;
use crate::registry::TypeRegistry;

/// Hydrates every typed element reachable from `node`/`scope`, returning the
/// entities produced at this level (children, not `node` itself — `node`'s
/// own typed-ness, if any, is the caller's concern, matching how the scope
/// graph's root has no type tag of its own).
///
/// # Errors
///
/// Returns [`HydrateError::Constructor`] if a registered constructor rejects
/// an element's body.
pub fn hydrate(
    node: &Node,
    scope: ScopeId,
    graph: &ScopeGraph,
    registry: &TypeRegistry,
) -> Result<IndexMap<String, Entity>, HydrateError> {
    let mut result = IndexMap::new();
    let Some(mapping) = node.as_mapping() else {
        return Ok(result);
    };

    for (key, value) in mapping {
        if key == "extends" {
            continue;
        }
        let Some((type_tag, name)) = split_typed_key(key) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        let Some(child_scope) = find_child_scope(graph, scope, &name) else {
            continue;
        };

        let grandchildren = hydrate(value, child_scope, graph, registry)?;

        if registry.contains(&type_tag) {
            let ctx = ConstructorContext {
                name: &name,
                type_tag: &type_tag,
                body: value,
                scope: child_scope,
                graph,
            };
            if let Some(entity) = registry.construct(&ctx, grandchildren)? {
                result.insert(name, entity);
            }
        } else {
            result.extend(grandchildren);
        }
    }

    Ok(result)
}

/// Finds the [`ScopeId`] the scope graph allocated for the typed child named
/// `name` directly under `scope`.
fn find_child_scope(graph: &ScopeGraph, scope: ScopeId, name: &str) -> Option<ScopeId> {
    graph.local_bindings(scope).find_map(|(binding_name, binding)| {
        if binding_name != name {
            return None;
        }
        match binding {
            Binding::ChildScope(id) => Some(*id),
            _ => None,
        }
    })
}

/// Splits a mapping key of the form `T.N` into `(T, N)`, mirroring
/// [`xenospec_scope`]'s own splitting so the two traversals stay in lockstep.
fn split_typed_key(key: &str) -> Option<(String, String)> {
    let (type_tag, name) = key.split_once('.')?;
    Some((type_tag.to_owned(), name.to_owned()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use crate::registry::PermissiveConstructor;
    use xenospec_core::SourceId;
    use xenospec_yaml::load_str;

    fn build(src: &str) -> (Node, ScopeGraph, ScopeId) {
        let node = load_str(src, SourceId::from("<test>")).expect("load");
        let (graph, root) = ScopeGraph::build(&node).expect("build");
        (node, graph, root)
    }

    #[test]
    fn hydrates_a_registered_builtin_type() {
        let (node, graph, root) = build("world.earth:\n  tide: 1\n");
        let registry = TypeRegistry::with_builtins();
        let entities = hydrate(&node, root, &graph, &registry).expect("hydrate");
        let earth = entities.get("earth").expect("earth entity");
        assert_eq!(earth.type_tag(), "world");
        assert_eq!(earth.name(), "earth");
    }

    #[test]
    fn unregistered_type_leaves_no_entity_at_its_own_level() {
        let (node, graph, root) = build("widget.gizmo:\n  color: red\n");
        let registry = TypeRegistry::empty();
        let entities = hydrate(&node, root, &graph, &registry).expect("hydrate");
        assert!(entities.is_empty());
    }

    #[test]
    fn unregistered_types_nested_typed_children_are_promoted() {
        let (node, graph, root) = build(
            "widget.gizmo:\n  world.core:\n    tide: 1\n",
        );
        let registry = TypeRegistry::with_builtins();
        let entities = hydrate(&node, root, &graph, &registry).expect("hydrate");
        assert!(!entities.contains_key("gizmo"));
        let core = entities.get("core").expect("promoted core entity");
        assert_eq!(core.type_tag(), "world");
    }

    #[test]
    fn nested_typed_elements_hydrate_bottom_up() {
        let (node, graph, root) = build(
            "scenario.trial:\n  world.earth:\n    tide: 1\n",
        );
        let registry = TypeRegistry::with_builtins();
        let entities = hydrate(&node, root, &graph, &registry).expect("hydrate");
        let trial = entities.get("trial").expect("trial entity");
        let earth = trial.child("earth").expect("nested earth entity");
        assert_eq!(earth.type_tag(), "world");
    }

    #[test]
    fn custom_registered_constructor_can_reject_a_body() {
        struct RequiresTide;
        impl crate::registry::EntityConstructor for RequiresTide {
            fn validate(&self, ctx: &ConstructorContext<'_>) -> Result<(), String> {
                if ctx.body.get("tide").is_none() {
                    return Err("missing required field `tide`".to_owned());
                }
                Ok(())
            }
        }

        let (node, graph, root) = build("species.plankton:\n  name: plankton\n");
        let mut registry = TypeRegistry::empty();
        registry.register("species", RequiresTide).expect("register");
        let err = hydrate(&node, root, &graph, &registry).unwrap_err();
        assert!(matches!(err, HydrateError::Constructor { .. }));
    }

    #[test]
    fn permissive_constructor_accepts_any_body() {
        let constructor = PermissiveConstructor;
        let (node, graph, root) = build("a: 1\n");
        let ctx = ConstructorContext {
            name: "x",
            type_tag: "world",
            body: &node,
            scope: root,
            graph: &graph,
        };
        assert!(constructor.validate(&ctx).is_ok());
    }
}
