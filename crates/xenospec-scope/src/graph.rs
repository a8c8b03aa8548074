// crates/xenospec-scope/src/graph.rs
// ============================================================================
// Module: XenoSpec Scope Graph
// Description: Arena-backed scope tree with dotted-name lookup, `extends`
// overrides, and tombstone shadowing.
// Purpose: Implements spec.md §4.3 and the Scope lookup rule from §3.
// Dependencies: indexmap, xenospec-core, xenospec-yaml
// ============================================================================

//! ## Overview
//! [`ScopeGraph::build`] walks a resolved [`Node`] tree once, producing a
//! flat arena of scopes. Each scope's local bindings map a name either to an
//! ordinary value, a child scope (created by a typed element `T.N:`), or a
//! tombstone (an explicit `~` shadowing an inherited name).

use std::collections::HashMap;
use std::collections::HashSet;

use xenospec_core::SourceSpan;
use xenospec_yaml::Node;
use xenospec_yaml::NodeValue;
use xenospec_yaml::Scalar;

use crate::error::ScopeError;

/// Identifies a scope within a [`ScopeGraph`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

/// What a name is bound to within a single scope's local bindings.
#[derive(Debug, Clone)]
pub enum Binding {
    /// An ordinary value, not itself a scope.
    Value(Node),
    /// A child scope, created by a typed element `T.N:`.
    ChildScope(ScopeId),
    /// An explicit `~` shadow: the name is present locally but resolves to
    /// "absent", hiding any inherited binding of the same name.
    Tombstone,
}

/// The result of a dotted-name lookup.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// The name resolved to a plain value.
    Value(Node),
    /// The name resolved to a scope (the final dotted segment named a typed
    /// element rather than an ordinary key).
    Scope(ScopeId),
    /// The first segment was not found in the scope chain and must be
    /// delegated to the fetch/lookup layer (spec.md §3 Scope).
    FallThroughToFetch,
    /// A segment after the first resolved to a tombstone or a missing
    /// member; the dotted name is unresolved within scope and is not a
    /// fetch fallback candidate (the first segment *was* found).
    NotFound,
}

/// A single scope's data: its local bindings and its parent, if any.
#[derive(Debug, Clone, Default)]
struct ScopeData {
    /// Local name bindings, in declaration order of first insertion.
    bindings: HashMap<String, Binding>,
    /// Parent scope, set to the lexical enclosing scope unless overridden
    /// by `extends:`.
    parent: Option<ScopeId>,
    /// Optional human-readable name for diagnostics.
    display_name: Option<String>,
    /// The `T` component of the `T.N:` key that created this scope, if any.
    /// `xenospec-hydrate` uses this to pick a constructor; an unregistered
    /// `T` is the hydrator's problem, not this crate's (spec.md §3 "Unknown
    /// T is treated as a literal key").
    type_tag: Option<String>,
}

/// The full arena of scopes produced by [`ScopeGraph::build`].
#[derive(Debug, Clone)]
pub struct ScopeGraph {
    /// All scopes, indexed by [`ScopeId`].
    scopes: Vec<ScopeData>,
    /// `extends:` targets collected during construction, resolved once the
    /// whole tree has been walked so forward references work.
    pending_extends: Vec<(ScopeId, String, SourceSpan)>,
}

impl ScopeGraph {
    /// Builds a scope graph from a resolved root node, returning the graph
    /// and the id of its root scope.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::CyclicExtends`] if an `extends:` chain cycles,
    /// [`ScopeError::UnknownExtendsTarget`] if an `extends:` name does not
    /// resolve, or [`ScopeError::MalformedTypedKey`] if a dotted key has no
    /// name component.
    pub fn build(root: &Node) -> Result<(Self, ScopeId), ScopeError> {
        let mut graph = Self {
            scopes: Vec::new(),
            pending_extends: Vec::new(),
        };
        let root_id = graph.build_scope(root, None, None, None)?;
        graph.apply_extends()?;
        Ok((graph, root_id))
    }

    /// Allocates a new scope and recursively builds its local bindings.
    fn build_scope(
        &mut self,
        node: &Node,
        lexical_parent: Option<ScopeId>,
        display_name: Option<String>,
        type_tag: Option<String>,
    ) -> Result<ScopeId, ScopeError> {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(ScopeData {
            bindings: HashMap::new(),
            parent: lexical_parent,
            display_name,
            type_tag,
        });

        let Some(mapping) = node.as_mapping() else {
            return Ok(id);
        };

        let mut extends_target: Option<(String, SourceSpan)> = None;
        for (key, value) in mapping {
            if key == "extends" {
                if let Some(name) = value.as_str() {
                    extends_target = Some((name.to_owned(), value.span.clone()));
                }
                continue;
            }
            if let Some((type_tag, name)) = split_typed_key(key) {
                if name.is_empty() {
                    return Err(ScopeError::MalformedTypedKey {
                        key: key.clone(),
                        span: value.span.clone(),
                    });
                }
                let child =
                    self.build_scope(value, Some(id), Some(name.clone()), Some(type_tag))?;
                self.scopes[id.0]
                    .bindings
                    .insert(name, Binding::ChildScope(child));
            } else {
                let binding = if is_null(value) {
                    Binding::Tombstone
                } else {
                    Binding::Value(value.clone())
                };
                self.scopes[id.0].bindings.insert(key.clone(), binding);
            }
        }

        if let Some((target, span)) = extends_target {
            self.pending_extends.push((id, target, span));
        }
        Ok(id)
    }

    /// Resolves every scope's pending `extends:` target, detecting cycles.
    fn apply_extends(&mut self) -> Result<(), ScopeError> {
        let pending = std::mem::take(&mut self.pending_extends);
        for (id, target, span) in pending {
            let lexical_start = self.scopes[id.0].parent;
            let resolved = self.resolve_extends_target(lexical_start, &target);
            match resolved {
                Some(parent) => {
                    let mut visited = HashSet::new();
                    visited.insert(id);
                    let mut cursor = Some(parent);
                    while let Some(current) = cursor {
                        if !visited.insert(current) {
                            return Err(ScopeError::CyclicExtends {
                                name: target,
                                span,
                            });
                        }
                        cursor = self.scopes[current.0].parent;
                    }
                    self.scopes[id.0].parent = Some(parent);
                }
                None => {
                    return Err(ScopeError::UnknownExtendsTarget { target, span });
                }
            }
        }
        Ok(())
    }

    /// Looks up an `extends:` target name by the same chain-climbing rule
    /// used for ordinary first-segment lookup, restricted to scope-valued
    /// bindings.
    fn resolve_extends_target(&self, from: Option<ScopeId>, name: &str) -> Option<ScopeId> {
        let mut cursor = from;
        while let Some(id) = cursor {
            if let Some(Binding::ChildScope(target)) = self.scopes[id.0].bindings.get(name) {
                return Some(*target);
            }
            cursor = self.scopes[id.0].parent;
        }
        None
    }

    /// Looks up a dotted name starting from `scope`, per spec.md §3's Scope
    /// lookup rule.
    #[must_use]
    pub fn lookup(&self, scope: ScopeId, dotted_name: &str) -> LookupOutcome {
        let mut segments = dotted_name.split('.');
        let Some(first) = segments.next() else {
            return LookupOutcome::FallThroughToFetch;
        };

        let mut cursor = Some(scope);
        let mut found: Option<&Binding> = None;
        while let Some(id) = cursor {
            match self.scopes[id.0].bindings.get(first) {
                Some(Binding::Tombstone) => return LookupOutcome::NotFound,
                Some(binding) => {
                    found = Some(binding);
                    break;
                }
                None => cursor = self.scopes[id.0].parent,
            }
        }

        let Some(mut current) = found.cloned() else {
            return LookupOutcome::FallThroughToFetch;
        };

        for segment in segments {
            current = match current {
                Binding::Value(node) => match node.get(segment) {
                    Some(child) => Binding::Value(child.clone()),
                    None => return LookupOutcome::NotFound,
                },
                Binding::ChildScope(id) => match self.scopes[id.0].bindings.get(segment) {
                    Some(Binding::Tombstone) | None => return LookupOutcome::NotFound,
                    Some(binding) => binding.clone(),
                },
                Binding::Tombstone => return LookupOutcome::NotFound,
            };
        }

        match current {
            Binding::Value(node) => LookupOutcome::Value(node),
            Binding::ChildScope(id) => LookupOutcome::Scope(id),
            Binding::Tombstone => LookupOutcome::NotFound,
        }
    }

    /// Returns the display name registered for a scope, if any.
    #[must_use]
    pub fn display_name(&self, scope: ScopeId) -> Option<&str> {
        self.scopes[scope.0].display_name.as_deref()
    }

    /// Returns the parent of a scope, if any.
    #[must_use]
    pub fn parent_of(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    /// Returns the `T` component of the typed element that created this
    /// scope, if it was created that way (the root scope and scopes built
    /// directly from a mapping node have none).
    #[must_use]
    pub fn type_tag(&self, scope: ScopeId) -> Option<&str> {
        self.scopes[scope.0].type_tag.as_deref()
    }

    /// Iterates the local bindings of a scope without climbing to parents.
    pub fn local_bindings(&self, scope: ScopeId) -> impl Iterator<Item = (&str, &Binding)> {
        self.scopes[scope.0]
            .bindings
            .iter()
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Splits a mapping key of the form `T.N` into `(T, N)`. Keys with no dot
/// are not typed elements and return `None`. A dotted key with an empty tail
/// (e.g. `"species."`) is still reported as a typed key so the caller can
/// raise `MalformedTypedKey`.
fn split_typed_key(key: &str) -> Option<(String, String)> {
    let (type_tag, name) = key.split_once('.')?;
    Some((type_tag.to_owned(), name.to_owned()))
}

/// Returns `true` if the node is a YAML null scalar.
fn is_null(node: &Node) -> bool {
    matches!(node.value, NodeValue::Scalar(Scalar::Null))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::panic, reason = "tests use expect_used/panic on deterministic fixtures")]
    use super::*;
    use xenospec_core::SourceId;
    use xenospec_yaml::load_str;

    fn build(src: &str) -> (ScopeGraph, ScopeId) {
        let node = load_str(src, SourceId::from("<test>")).expect("load");
        ScopeGraph::build(&node).expect("build")
    }

    #[test]
    fn looks_up_a_plain_local_binding() {
        let (graph, root) = build("a: 1\n");
        assert!(matches!(graph.lookup(root, "a"), LookupOutcome::Value(_)));
    }

    #[test]
    fn typed_element_registers_under_its_name() {
        let (graph, root) = build("world.earth:\n  tide: 1\n");
        match graph.lookup(root, "earth") {
            LookupOutcome::Scope(id) => {
                assert!(matches!(graph.lookup(id, "tide"), LookupOutcome::Value(_)));
            }
            other => panic!("expected scope, got {other:?}"),
        }
    }

    #[test]
    fn missing_first_segment_falls_through_to_fetch() {
        let (graph, root) = build("a: 1\n");
        assert!(matches!(
            graph.lookup(root, "nowhere"),
            LookupOutcome::FallThroughToFetch
        ));
    }

    #[test]
    fn tombstone_shadows_inherited_key() {
        let (graph, root) = build("world.earth:\n  a: 1\n  child.inner:\n    a: ~\n");
        let earth = match graph.lookup(root, "earth") {
            LookupOutcome::Scope(id) => id,
            other => panic!("expected scope, got {other:?}"),
        };
        let inner = match graph.lookup(earth, "inner") {
            LookupOutcome::Scope(id) => id,
            other => panic!("expected scope, got {other:?}"),
        };
        assert!(matches!(graph.lookup(inner, "a"), LookupOutcome::NotFound));
    }

    #[test]
    fn extends_overrides_lexical_parent() {
        let (graph, root) = build(
            "world.base:\n  shared: 1\nworld.derived:\n  extends: base\n  own: 2\n",
        );
        let derived = match graph.lookup(root, "derived") {
            LookupOutcome::Scope(id) => id,
            other => panic!("expected scope, got {other:?}"),
        };
        assert!(matches!(
            graph.lookup(derived, "shared"),
            LookupOutcome::Value(_)
        ));
    }
}
