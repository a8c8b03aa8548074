// crates/xenospec-resolve/src/resolver.rs
// ============================================================================
// Module: XenoSpec Reference Resolver
// Description: Single-pass, left-to-right, depth-first expansion of
// `!include` and `!ref` tags, with cycle detection.
// Purpose: Implement spec.md §4.2 so that by the time the scope graph is
// built, the tree contains no structural tags at all (invariant 1 of §3).
// Dependencies: indexmap, xenospec-core, xenospec-fetch, xenospec-yaml
// ============================================================================

//! ## Overview
//! [`resolve`] walks a loaded [`Node`] tree once, left to right, depth first:
//!
//! - `!include path` is replaced by the parsed content of the file at `path`
//!   (relative to the including document), then recursed into.
//! - `!ref name` is replaced by a deep copy of the subtree `name` resolves
//!   to, then recursed into.
//! - `!ev` and `!_` are left untouched; the tree produced still contains
//!   them (spec.md §4.2 only resolves structural tags).
//!
//! Because the scope graph (with its `extends:` overrides) is built only
//! *after* resolution, this module tracks its own lightweight lexical
//! environment: a stack of frames, one per mapping nesting level, each
//! accumulating bindings as sibling keys are resolved in declaration order.
//! A `!ref` can see any binding already resolved at its own nesting level or
//! an ancestor's — but not a sibling declared later, matching the
//! left-to-right, depth-first pass order spec.md prescribes.

use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use xenospec_core::Specifier;
use xenospec_fetch::FetchEngine;
use xenospec_yaml::load_file;
use xenospec_yaml::Mapping;
use xenospec_yaml::Node;
use xenospec_yaml::NodeValue;
use xenospec_yaml::TagValue;

use crate::error::ResolveError;

/// One nesting level's bindings, consulted innermost-first during lookup.
type Env = Vec<IndexMap<String, Node>>;

/// A currently-expanding `(source, tag, name)` triple, tracked to detect
/// cycles per spec.md §4.2.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InFlight {
    /// An `!include` currently expanding the file at this path.
    Include(String),
    /// A `!ref` currently expanding this dotted name, scoped by the source
    /// document it was encountered in (the same name may legitimately be
    /// referenced from unrelated documents without being cyclic).
    Reference(String, String),
}

/// Resolves every `!include` and `!ref` tag in `root`, returning a tree with
/// no structural tags remaining.
///
/// `fetch` is consulted only as the fallback lookup layer for `!ref` names
/// that are not found in the lexical environment (spec.md §3's "failure at
/// any step falls back to the module/root lookup layer").
///
/// # Errors
///
/// Returns [`ResolveError::CyclicInclude`] / [`ResolveError::CyclicReference`]
/// on cycles, [`ResolveError::UnresolvedReference`] when a `!ref` name
/// cannot be found anywhere, and [`ResolveError::IncludeLoad`] /
/// [`ResolveError::FetchFallback`] when loading fails outright.
pub fn resolve(root: &Node, fetch: &FetchEngine) -> Result<Node, ResolveError> {
    let mut env: Env = Vec::new();
    let mut in_flight: HashSet<InFlight> = HashSet::new();
    resolve_node(root, &mut env, &mut in_flight, fetch)
}

/// Resolves a single node, recursing into mappings and sequences and
/// expanding `Include`/`Reference` tags in place.
fn resolve_node(
    node: &Node,
    env: &mut Env,
    in_flight: &mut HashSet<InFlight>,
    fetch: &FetchEngine,
) -> Result<Node, ResolveError> {
    match &node.value {
        NodeValue::Scalar(_) => Ok(node.clone()),
        NodeValue::Sequence(items) => {
            let mut resolved = Vec::with_capacity(items.len());
            for item in items {
                resolved.push(resolve_node(item, env, in_flight, fetch)?);
            }
            Ok(Node::new(NodeValue::Sequence(resolved), node.span.clone()))
        }
        NodeValue::Mapping(mapping) => resolve_mapping(mapping, node, env, in_flight, fetch),
        NodeValue::Tag(tag) => match tag.as_ref() {
            TagValue::Include(path) => {
                resolve_include(path, node, env, in_flight, fetch)
            }
            TagValue::Reference(name) => {
                resolve_reference(name, node, env, in_flight, fetch)
            }
            TagValue::Evaluable(_) | TagValue::Quoted(_) => Ok(node.clone()),
        },
    }
}

/// Resolves a mapping's entries in declaration order, growing a fresh env
/// frame so each key can see its already-resolved siblings and all ancestor
/// bindings.
fn resolve_mapping(
    mapping: &Mapping,
    node: &Node,
    env: &mut Env,
    in_flight: &mut HashSet<InFlight>,
    fetch: &FetchEngine,
) -> Result<Node, ResolveError> {
    env.push(IndexMap::new());
    let mut result = Mapping::new();
    for (key, value) in mapping {
        let resolved_value = resolve_node(value, env, in_flight, fetch)?;
        let binding_name = split_typed_key(key).unwrap_or_else(|| key.clone());
        if let Some(frame) = env.last_mut() {
            frame.insert(binding_name, resolved_value.clone());
        }
        result.insert(key.clone(), resolved_value);
    }
    env.pop();
    Ok(Node::new(NodeValue::Mapping(result), node.span.clone()))
}

/// Splits a `T.N` typed-element key into its element name `N`, registering
/// references under the element name rather than the full `T.N` key (the
/// scope graph does the same in spec.md §4.3).
fn split_typed_key(key: &str) -> Option<String> {
    key.split_once('.').map(|(_, name)| name.to_owned())
}

/// Expands `!include path`, loading the target relative to the including
/// document and recursing into the substituted content.
fn resolve_include(
    path: &str,
    node: &Node,
    env: &mut Env,
    in_flight: &mut HashSet<InFlight>,
    fetch: &FetchEngine,
) -> Result<Node, ResolveError> {
    let key = InFlight::Include(path.to_owned());
    if !in_flight.insert(key.clone()) {
        return Err(ResolveError::CyclicInclude {
            path: path.to_owned(),
            span: node.span.clone(),
        });
    }

    let include_path = resolve_include_path(path, node.span.source.as_str());
    let substituted = load_file(&include_path).map_err(|source| ResolveError::IncludeLoad {
        path: path.to_owned(),
        span: node.span.clone(),
        source,
    })?;
    let result = resolve_node(&substituted, env, in_flight, fetch);
    in_flight.remove(&key);
    result
}

/// Joins an include path against its enclosing document's directory, unless
/// the path is itself absolute.
fn resolve_include_path(path: &str, enclosing_source: &str) -> PathBuf {
    if path.starts_with('/') {
        return PathBuf::from(path);
    }
    let base_dir = Path::new(enclosing_source)
        .parent()
        .unwrap_or_else(|| Path::new("."));
    base_dir.join(path)
}

/// Expands `!ref name`, looking it up in the lexical environment first and
/// falling back to `fetch` on a miss, then deep-copying the result and
/// recursing into it.
fn resolve_reference(
    name: &str,
    node: &Node,
    env: &mut Env,
    in_flight: &mut HashSet<InFlight>,
    fetch: &FetchEngine,
) -> Result<Node, ResolveError> {
    let key = InFlight::Reference(node.span.source.as_str().to_owned(), name.to_owned());
    if !in_flight.insert(key.clone()) {
        return Err(ResolveError::CyclicReference {
            name: name.to_owned(),
            span: node.span.clone(),
        });
    }

    let target = lookup_env(env, name)
        .map(Ok)
        .unwrap_or_else(|| fallback_to_fetch(name, node, fetch))?;
    let result = resolve_node(&target, env, in_flight, fetch);
    in_flight.remove(&key);
    result
}

/// Looks up a dotted name in the environment: the first segment climbs the
/// frame stack innermost-first, remaining segments are ordinary member
/// access on the resolved node.
fn lookup_env(env: &Env, dotted_name: &str) -> Option<Node> {
    let mut segments = dotted_name.split('.');
    let first = segments.next()?;
    let mut current = env.iter().rev().find_map(|frame| frame.get(first).cloned())?;
    for segment in segments {
        current = current.get(segment)?.clone();
    }
    Some(current)
}

/// Falls back to the fetch layer for a `!ref` name not found in scope.
fn fallback_to_fetch(name: &str, node: &Node, fetch: &FetchEngine) -> Result<Node, ResolveError> {
    let specifier = Specifier::parse(name);
    let base_dir = Path::new(node.span.source.as_str()).parent();
    fetch
        .fetch(&specifier, base_dir)
        .map(|arc| (*arc).clone())
        .map_err(|err| {
            if matches!(err, xenospec_fetch::FetchError::NotFound { .. }) {
                ResolveError::UnresolvedReference {
                    name: name.to_owned(),
                    span: node.span.clone(),
                }
            } else {
                ResolveError::FetchFallback {
                    name: name.to_owned(),
                    span: node.span.clone(),
                    source: err,
                }
            }
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use xenospec_core::SourceId;
    use xenospec_yaml::load_str;

    fn fetch_engine() -> FetchEngine {
        FetchEngine::new(vec![])
    }

    #[test]
    fn leaves_plain_trees_untouched() {
        let node = load_str("a: 1\nb: 2\n", SourceId::from("<test>")).expect("load");
        let resolved = resolve(&node, &fetch_engine()).expect("resolve");
        assert_eq!(resolved, node);
    }

    #[test]
    fn resolves_a_reference_to_an_earlier_sibling() {
        let node = load_str("a: 1\nb: !ref a\n", SourceId::from("<test>")).expect("load");
        let resolved = resolve(&node, &fetch_engine()).expect("resolve");
        let mapping = resolved.as_mapping().expect("mapping");
        assert!(!mapping["b"].contains_structural_tag());
        assert_eq!(mapping["a"], mapping["b"]);
    }

    #[test]
    fn resolves_a_reference_through_a_typed_element_name() {
        let node = load_str(
            "world.earth:\n  tide: 1\nderived: !ref earth.tide\n",
            SourceId::from("<test>"),
        )
        .expect("load");
        let resolved = resolve(&node, &fetch_engine()).expect("resolve");
        let mapping = resolved.as_mapping().expect("mapping");
        assert_eq!(mapping["derived"].as_tag(), None);
    }

    #[test]
    fn detects_self_referential_cycles() {
        let node = load_str("a: !ref a\n", SourceId::from("<test>")).expect("load");
        let err = resolve(&node, &fetch_engine()).unwrap_err();
        assert!(matches!(err, ResolveError::CyclicReference { .. }));
    }

    #[test]
    fn unresolved_reference_with_no_fetch_roots_is_an_error() {
        let node = load_str("a: !ref nowhere\n", SourceId::from("<test>")).expect("load");
        let err = resolve(&node, &fetch_engine()).unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedReference { .. }));
    }

    #[test]
    fn ev_and_quoted_tags_survive_resolution() {
        let node = load_str("x: !ev \"1 + 1\"\ny: !_ \"rate(x)\"\n", SourceId::from("<test>"))
            .expect("load");
        let resolved = resolve(&node, &fetch_engine()).expect("resolve");
        let mapping = resolved.as_mapping().expect("mapping");
        assert!(matches!(mapping["x"].as_tag(), Some(TagValue::Evaluable(_))));
        assert!(matches!(mapping["y"].as_tag(), Some(TagValue::Quoted(_))));
    }

    #[test]
    fn includes_a_sibling_file_relative_to_the_including_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("inner.yaml"), "value: 42\n").expect("write");
        let main_path = dir.path().join("main.yaml");
        std::fs::write(&main_path, "outer: !include inner.yaml\n").expect("write");
        let node = load_file(&main_path).expect("load");
        let resolved = resolve(&node, &fetch_engine()).expect("resolve");
        let mapping = resolved.as_mapping().expect("mapping");
        let outer = mapping["outer"].as_mapping().expect("mapping");
        assert_eq!(outer["value"].as_tag(), None);
    }

    #[test]
    fn detects_cyclic_includes() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.yaml"), "x: !include b.yaml\n").expect("write");
        std::fs::write(dir.path().join("b.yaml"), "y: !include a.yaml\n").expect("write");
        let node = load_file(&dir.path().join("a.yaml")).expect("load");
        let err = resolve(&node, &fetch_engine()).unwrap_err();
        assert!(matches!(err, ResolveError::CyclicInclude { .. }));
    }
}
