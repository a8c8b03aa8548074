// crates/xenospec-hydrate/src/entity.rs
// ============================================================================
// Module: XenoSpec Hydrate Entity
// Description: The typed object produced by hydrating a `T.N:` element.
// Purpose: Give downstream crates (template, session, experiment) a uniform
// handle onto a typed element's body, scope, and already-hydrated typed
// children (spec.md §3 Entity, §4.5).
// Dependencies: indexmap, xenospec-scope, xenospec-yaml
// ============================================================================

//! ## Overview
//! An [`Entity`] is deliberately thin: it pairs a typed element's raw body
//! (still possibly containing `!ev`/`!_` tags — hydration is purely
//! structural and must not force their evaluation) with the scope it was
//! hydrated into and the entities of its own nested typed elements.

use indexmap::IndexMap;
use xenospec_scope::ScopeId;
use xenospec_yaml::Node;

/// A hydrated typed element.
#[derive(Debug, Clone)]
pub struct Entity {
    /// The `T` component of the `T.N:` key that produced this entity.
    type_tag: String,
    /// The `N` component: this element's dotted name within its enclosing
    /// scope.
    name: String,
    /// The scope this element's own body was hydrated into (its local
    /// bindings are this entity's fields).
    scope: ScopeId,
    /// The element's raw, reference-resolved body. Still contains `!ev`
    /// and `!_` tags where present — hydration never evaluates them.
    body: Node,
    /// This entity's own nested typed elements, already hydrated, keyed by
    /// their dotted name (not `T.N`).
    children: IndexMap<String, Entity>,
}

impl Entity {
    /// Builds a new entity. Used only by [`crate::hydrate`]; constructors
    /// receive an already-built [`Entity`] rather than assembling one
    /// themselves.
    #[must_use]
    pub(crate) fn new(
        type_tag: String,
        name: String,
        scope: ScopeId,
        body: Node,
        children: IndexMap<String, Entity>,
    ) -> Self {
        Self {
            type_tag,
            name,
            scope,
            body,
            children,
        }
    }

    /// The registered type name that produced this entity.
    #[must_use]
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// This entity's dotted name within its enclosing scope.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scope this entity's own fields live in.
    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The entity's raw, reference-resolved (but not evaluated) body.
    #[must_use]
    pub fn body(&self) -> &Node {
        &self.body
    }

    /// This entity's own nested typed elements, already hydrated.
    #[must_use]
    pub fn children(&self) -> &IndexMap<String, Entity> {
        &self.children
    }

    /// Looks up a nested typed child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Entity> {
        self.children.get(name)
    }

    /// Re-wraps this entity with `body` substituted for its own, keeping
    /// `type_tag`/`name`/`scope`/`children` unchanged.
    ///
    /// Used to hand a template-expanded tree (spec.md §4.6) back to callers
    /// that only ever consume an [`Entity`] (`xenospec-session`'s
    /// `Scenario::from_entity`, `xenospec-experiment`'s
    /// `ExperimentSpec::from_entity`) without exposing [`Entity::new`]
    /// itself — expansion happens after hydration, at the `build` stage, so
    /// it only ever replaces a body that has already been hydrated once.
    #[must_use]
    pub fn with_body(&self, body: Node) -> Self {
        Self {
            type_tag: self.type_tag.clone(),
            name: self.name.clone(),
            scope: self.scope,
            body,
            children: self.children.clone(),
        }
    }
}
