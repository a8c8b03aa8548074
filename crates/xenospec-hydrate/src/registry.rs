// crates/xenospec-hydrate/src/registry.rs
// ============================================================================
// Module: XenoSpec Hydrate Registry
// Description: Process-wide mapping from registered type names to entity
// constructors.
// Purpose: Implements the first half of spec.md §4.5: "A process-wide
// registry maps type names... to constructors."
// Dependencies: xenospec-scope, xenospec-yaml
// ============================================================================

//! ## Overview
//! [`TypeRegistry`] is a simple keyed map of constructors, deliberately
//! modeled on the provider-registry shape used elsewhere in this codebase:
//! trait objects behind a `BTreeMap`, looked up by string key, with a
//! built-in set registered by default.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use xenospec_scope::ScopeGraph;
use xenospec_scope::ScopeId;
use xenospec_yaml::Node;

use crate::entity::Entity;
use crate::error::HydrateError;

/// Everything a constructor needs to validate and assemble an entity.
#[derive(Debug, Clone, Copy)]
pub struct ConstructorContext<'a> {
    /// The element's dotted name.
    pub name: &'a str,
    /// The `T` component of the `T.N:` key.
    pub type_tag: &'a str,
    /// The element's raw, reference-resolved body.
    pub body: &'a Node,
    /// The scope this element's own body was hydrated into.
    pub scope: ScopeId,
    /// The full scope graph, for constructors that need to inspect parentage.
    pub graph: &'a ScopeGraph,
}

/// A type-specific entity constructor.
///
/// Implementations validate `ctx.body`'s shape and may reject it; they never
/// evaluate `!ev`/`!_` tags (spec.md §4.5: "Hydration is purely structural").
pub trait EntityConstructor: Send + Sync {
    /// Validates `ctx`, returning an error description if the body is
    /// malformed for this type. A constructor that imposes no additional
    /// shape beyond "is a mapping" can simply return `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message describing why the body is invalid.
    fn validate(&self, ctx: &ConstructorContext<'_>) -> Result<(), String>;
}

/// The default constructor: accepts any body, imposing no further shape.
/// Used for every built-in type name, since spec.md does not mandate a
/// fixed schema for `world`/`scenario`/`scope`/`experiment` bodies beyond
/// "a mapping" — their structure is interpreted by later stages (template
/// expansion, session construction).
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveConstructor;

impl EntityConstructor for PermissiveConstructor {
    fn validate(&self, _ctx: &ConstructorContext<'_>) -> Result<(), String> {
        Ok(())
    }
}

/// Maps registered type names to their constructors.
pub struct TypeRegistry {
    /// Registered constructors, keyed by type tag.
    constructors: BTreeMap<String, Box<dyn EntityConstructor>>,
}

/// The built-in type names recognized without explicit registration
/// (spec.md §4.5: "`world`, `scenario`, `scope`, `experiment`, plus
/// user-registered names").
pub const BUILTIN_TYPES: &[&str] = &["world", "scenario", "scope", "experiment"];

impl TypeRegistry {
    /// Creates an empty registry with no types recognized.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Creates a registry with [`BUILTIN_TYPES`] registered against
    /// [`PermissiveConstructor`].
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for &type_tag in BUILTIN_TYPES {
            registry
                .constructors
                .insert(type_tag.to_owned(), Box::new(PermissiveConstructor));
        }
        registry
    }

    /// Registers a constructor under `type_tag`.
    ///
    /// # Errors
    ///
    /// Returns [`HydrateError::DuplicateType`] if `type_tag` is already
    /// registered.
    pub fn register(
        &mut self,
        type_tag: impl Into<String>,
        constructor: impl EntityConstructor + 'static,
    ) -> Result<(), HydrateError> {
        let type_tag = type_tag.into();
        if self.constructors.contains_key(&type_tag) {
            return Err(HydrateError::DuplicateType { type_tag });
        }
        self.constructors.insert(type_tag, Box::new(constructor));
        Ok(())
    }

    /// Returns `true` if `type_tag` has a registered constructor.
    #[must_use]
    pub fn contains(&self, type_tag: &str) -> bool {
        self.constructors.contains_key(type_tag)
    }

    /// Invokes the constructor registered for `ctx.type_tag`, if any,
    /// producing the finished [`Entity`].
    ///
    /// Returns `Ok(None)` when `ctx.type_tag` has no registered constructor
    /// — spec.md §4.5 makes typed-element syntax opt-in, so an unregistered
    /// `T` is never an error at this layer.
    ///
    /// # Errors
    ///
    /// Returns [`HydrateError::Constructor`] if a registered constructor
    /// rejects the body.
    pub(crate) fn construct(
        &self,
        ctx: &ConstructorContext<'_>,
        children: IndexMap<String, Entity>,
    ) -> Result<Option<Entity>, HydrateError> {
        let Some(constructor) = self.constructors.get(ctx.type_tag) else {
            return Ok(None);
        };
        constructor
            .validate(ctx)
            .map_err(|message| HydrateError::Constructor {
                type_tag: ctx.type_tag.to_owned(),
                name: ctx.name.to_owned(),
                message,
                span: ctx.body.span.clone(),
            })?;
        Ok(Some(Entity::new(
            ctx.type_tag.to_owned(),
            ctx.name.to_owned(),
            ctx.scope,
            ctx.body.clone(),
            children,
        )))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use xenospec_core::SourceId;
    use xenospec_yaml::load_str;

    #[test]
    fn builtins_are_registered_by_default() {
        let registry = TypeRegistry::with_builtins();
        for &name in BUILTIN_TYPES {
            assert!(registry.contains(name));
        }
        assert!(!registry.contains("species"));
    }

    #[test]
    fn registering_a_duplicate_type_is_an_error() {
        let mut registry = TypeRegistry::empty();
        registry.register("custom", PermissiveConstructor).expect("first");
        let err = registry
            .register("custom", PermissiveConstructor)
            .unwrap_err();
        assert!(matches!(err, HydrateError::DuplicateType { .. }));
    }

    #[test]
    fn unregistered_type_returns_none_not_an_error() {
        let registry = TypeRegistry::empty();
        let node = load_str("a: 1\n", SourceId::from("<test>")).expect("load");
        let (graph, scope) = ScopeGraph::build(&node).expect("build");
        let ctx = ConstructorContext {
            name: "earth",
            type_tag: "world",
            body: &node,
            scope,
            graph: &graph,
        };
        let result = registry.construct(&ctx, IndexMap::new()).expect("construct");
        assert!(result.is_none());
    }
}
