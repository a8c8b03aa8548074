// crates/xenospec-template/src/expander.rs
// ============================================================================
// Module: XenoSpec Template Expander
// Description: Orchestrates `_params_`, `_instantiate_`, `_ports_`,
// `_modify_`, and guard application into a single build-stage entry point.
// Purpose: Implements spec.md §4.6 end to end.
// Dependencies: indexmap, xenospec-eval, xenospec-yaml
// ============================================================================

//! ## Overview
//! [`expand`] turns one entity body into its fully expanded tree: it
//! resolves `_params_:`, recursively expands every `_instantiate_:` entry
//! (collecting port bindings as it goes), applies `_modify_:`, and finally
//! runs every guard in force — local guards declared under `_guards_:`
//! layered on top of `inherited_guards`, composing rather than replacing
//! them (spec.md §4.6).
//!
//! `retry` guards re-run this entire function from scratch with a bumped
//! seed offset; `prune` guards remove the named offending top-level keys
//! and continue.

use indexmap::IndexMap;
use xenospec_eval::EvalValue;
use xenospec_yaml::Node;
use xenospec_yaml::NodeValue;

use crate::error::TemplateError;
use crate::guard::check_guard;
use crate::guard::FailMode;
use crate::guard::GuardApplication;
use crate::guard::GuardCheckError;
use crate::guard::GuardContext;
use crate::guard::GuardRegistry;
use crate::instantiate;
use crate::instantiate::TemplateLoader;
use crate::modify;
use crate::params;
use crate::ports;
use crate::ports::PortBinding;

/// The directive keys this crate recognizes at the top of an entity body;
/// everything else is carried through to the expanded tree verbatim.
const DIRECTIVE_KEYS: &[&str] = &["_params_", "_instantiate_", "_ports_", "_modify_", "_guards_"];

/// The result of expanding one entity body: the expanded tree plus every
/// port binding discovered while expanding its instances.
#[derive(Debug, Clone)]
pub struct ExpansionOutcome {
    /// The fully expanded tree.
    pub tree: Node,
    /// Port bindings collected from every nested `_instantiate_:` entry.
    pub port_bindings: Vec<PortBinding>,
}

/// Expands `body` into its fully materialized tree.
///
/// `inherited_guards` are guards applied at the instantiation site or by
/// global configuration; `body`'s own `_guards_:` declarations (if any)
/// compose with them rather than replacing them.
///
/// # Errors
///
/// Returns a [`TemplateError`] if any directive is malformed, a template
/// fails to load, or a guard rejects the expansion (in `reject` mode, or
/// after exhausting `retry`'s attempt budget).
pub fn expand(
    body: &Node,
    loader: &dyn TemplateLoader,
    registry: &GuardRegistry,
    inherited_guards: &[GuardApplication],
    parent_overrides: &IndexMap<String, EvalValue>,
    seed: u64,
    path: &str,
) -> Result<ExpansionOutcome, TemplateError> {
    let local_guards = parse_guard_applications(body)?;
    let all_guards: Vec<GuardApplication> = inherited_guards
        .iter()
        .cloned()
        .chain(local_guards)
        .collect();

    let mut attempt: u32 = 0;
    loop {
        let attempt_seed = seed.wrapping_add(u64::from(attempt));
        let mut outcome = expand_once(body, loader, registry, &all_guards, parent_overrides, attempt_seed, path)?;

        match run_all_guards(&all_guards, &mut outcome.tree, registry, path, seed, attempt) {
            Ok(()) => return Ok(outcome),
            Err(GuardFailure::Retry { max_attempts, .. }) if attempt + 1 < max_attempts => {
                attempt += 1;
            }
            Err(GuardFailure::Retry { guard, max_attempts }) => {
                return Err(TemplateError::GuardRetriesExhausted {
                    guard,
                    max_attempts,
                    message: "guard kept rejecting every retry attempt".to_owned(),
                })
            }
            Err(GuardFailure::Fatal(err)) => return Err(err),
        }
    }
}

/// One non-retrying expansion pass: resolves params, expands instances,
/// applies `_modify_`. Guards are checked by the caller afterward so a
/// `retry` application can redo this whole pass with a fresh seed.
fn expand_once(
    body: &Node,
    loader: &dyn TemplateLoader,
    registry: &GuardRegistry,
    all_guards: &[GuardApplication],
    parent_overrides: &IndexMap<String, EvalValue>,
    seed: u64,
    path: &str,
) -> Result<ExpansionOutcome, TemplateError> {
    let params = match body.get("_params_") {
        Some(declarations) => {
            params::resolve_params(declarations, parent_overrides, &IndexMap::new(), seed, path)?
        }
        None => parent_overrides.clone(),
    };

    let mut result = carry_through_mapping(body);
    let mut port_bindings = Vec::new();

    if let Some(instantiate_node) = body.get("_instantiate_") {
        if let Some(mapping) = instantiate_node.as_mapping() {
            for (key, value_node) in mapping {
                let resolved_instances =
                    instantiate::expand_instantiate_entry(key, value_node, loader, &params, seed, path)?;
                let raw_overrides = raw_string_overrides(value_node);

                for instance in resolved_instances {
                    let instance_path = format!("{path}.{}", instance.name);

                    let decls = match instance.template.get("_ports_") {
                        Some(ports_node) => ports::parse_ports(ports_node)?,
                        None => Vec::new(),
                    };
                    port_bindings.extend(ports::bind_ports(&decls, &raw_overrides));

                    let inner = expand(
                        &instance.template,
                        loader,
                        registry,
                        all_guards,
                        &instance.params,
                        seed,
                        &instance_path,
                    )?;
                    port_bindings.extend(inner.port_bindings);
                    result.insert(instance.name, inner.tree);
                }
            }
        }
    }

    let mut tree = Node::new(NodeValue::Mapping(result), body.span.clone());
    if let Some(modify_node) = body.get("_modify_") {
        modify::apply_modify(&mut tree, modify_node)?;
    }

    Ok(ExpansionOutcome {
        tree,
        port_bindings,
    })
}

/// Copies `body`'s mapping keys other than the recognized directive keys,
/// as the starting point for the expanded tree.
fn carry_through_mapping(body: &Node) -> xenospec_yaml::Mapping {
    let Some(mapping) = body.as_mapping() else {
        return xenospec_yaml::Mapping::new();
    };
    mapping
        .iter()
        .filter(|(key, _)| !DIRECTIVE_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Reads `value_node`'s mapping keys other than `_template_`/`_ports_`/
/// `_modify_` whose values are plain strings — candidate port-binding
/// producer paths, per spec.md §4.6.
fn raw_string_overrides(value_node: &Node) -> IndexMap<String, String> {
    let mut overrides = IndexMap::new();
    let Some(mapping) = value_node.as_mapping() else {
        return overrides;
    };
    for (key, node) in mapping {
        if key == "_template_" || key == "_ports_" || key == "_modify_" {
            continue;
        }
        if let Some(s) = node.as_str() {
            overrides.insert(key.clone(), s.to_owned());
        }
    }
    overrides
}

/// Parses `body`'s own `_guards_:` declarations, if present.
///
/// Each entry maps a registered guard's name to either the bare string
/// `"reject"` / `"prune"`, or a mapping `{mode: retry, max_attempts: N}`.
/// Absent `_guards_:`, no local guards are declared — the entity still
/// inherits whatever was passed in from its instantiation site.
fn parse_guard_applications(body: &Node) -> Result<Vec<GuardApplication>, TemplateError> {
    let Some(guards_node) = body.get("_guards_") else {
        return Ok(Vec::new());
    };
    let Some(mapping) = guards_node.as_mapping() else {
        return Ok(Vec::new());
    };
    let mut applications = Vec::with_capacity(mapping.len());
    for (name, mode_node) in mapping {
        let mode = parse_fail_mode(mode_node)?;
        applications.push(GuardApplication {
            name: name.clone(),
            mode,
        });
    }
    Ok(applications)
}

/// Parses one guard's fail-mode declaration.
fn parse_fail_mode(mode_node: &Node) -> Result<FailMode, TemplateError> {
    if let Some(text) = mode_node.as_str() {
        return match text {
            "reject" => Ok(FailMode::Reject),
            "prune" => Ok(FailMode::Prune),
            "retry" => Ok(FailMode::Retry { max_attempts: 1 }),
            other => Err(TemplateError::UnknownGuard {
                name: other.to_owned(),
            }),
        };
    }
    if let Some(mapping) = mode_node.as_mapping() {
        let mode_name = mapping.get("mode").and_then(Node::as_str).unwrap_or("reject");
        return match mode_name {
            "reject" => Ok(FailMode::Reject),
            "prune" => Ok(FailMode::Prune),
            "retry" => {
                let max_attempts = mapping
                    .get("max_attempts")
                    .and_then(attempt_count)
                    .unwrap_or(1);
                Ok(FailMode::Retry { max_attempts })
            }
            other => Err(TemplateError::UnknownGuard {
                name: other.to_owned(),
            }),
        };
    }
    Err(TemplateError::UnknownGuard {
        name: "<malformed _guards_ entry>".to_owned(),
    })
}

/// Reads a `max_attempts` node as a non-negative attempt count.
fn attempt_count(node: &Node) -> Option<u32> {
    match &node.value {
        NodeValue::Scalar(xenospec_yaml::Scalar::Int(i)) => u32::try_from(*i).ok(),
        _ => None,
    }
}

/// How checking every guard application against `tree` came out: either
/// every guard passed, or one failed in a way the caller must react to.
enum GuardFailure {
    /// A `retry` application failed; the caller should re-expand with a
    /// new seed if `max_attempts` allows another attempt.
    Retry {
        /// The guard that rejected this attempt.
        guard: String,
        /// The configured attempt ceiling.
        max_attempts: u32,
    },
    /// A `reject` application failed, or a guard name was never
    /// registered — both abort the build immediately.
    Fatal(TemplateError),
}

/// Checks every guard application against `tree`, mutating it in place
/// when a `prune` application removes offending top-level keys.
fn run_all_guards(
    applications: &[GuardApplication],
    tree: &mut Node,
    registry: &GuardRegistry,
    namespace: &str,
    seed: u64,
    attempt: u32,
) -> Result<(), GuardFailure> {
    for application in applications {
        let ctx = GuardContext {
            scope_name: namespace.to_owned(),
            namespace: namespace.to_owned(),
            seed,
            attempt,
        };
        match check_guard(&application.name, tree, &ctx, registry) {
            Ok(()) => {}
            Err(GuardCheckError::Unknown(err)) => return Err(GuardFailure::Fatal(err)),
            Err(GuardCheckError::Violation(violation)) => match &application.mode {
                FailMode::Reject => {
                    return Err(GuardFailure::Fatal(TemplateError::GuardRejected {
                        guard: application.name.clone(),
                        message: violation.message,
                        span: violation.span,
                    }))
                }
                FailMode::Retry { max_attempts } => {
                    return Err(GuardFailure::Retry {
                        guard: application.name.clone(),
                        max_attempts: *max_attempts,
                    })
                }
                FailMode::Prune => {
                    if let NodeValue::Mapping(mapping) = &mut tree.value {
                        for key in &violation.offending_keys {
                            let _ = mapping.shift_remove(key);
                        }
                    }
                }
            },
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

    /// A [`TemplateLoader`] backed by a fixed in-memory document, keyed by
    /// path.
    struct MapLoader(IndexMap<String, Node>);

    impl TemplateLoader for MapLoader {
        fn load_template(&self, path: &str) -> Result<Node, TemplateError> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| TemplateError::TemplateLoad {
                    path: path.to_owned(),
                    message: "no such template".to_owned(),
                })
        }
    }

    #[test]
    fn expands_with_no_directives_passes_body_through() {
        let body = load_str("name: plain\n", SourceId::from("<test>")).expect("load");
        let loader = MapLoader(IndexMap::new());
        let registry = GuardRegistry::empty();
        let outcome = expand(&body, &loader, &registry, &[], &IndexMap::new(), 0, "world")
            .expect("expand");
        assert!(outcome.tree.get("name").is_some());
        assert!(outcome.port_bindings.is_empty());
    }

    #[test]
    fn expands_a_single_instantiation_under_its_namespace() {
        let body = load_str(
            "_instantiate_:\n  water:\n    _template_: molecules/water\n    count: 3\n",
            SourceId::from("<test>"),
        )
        .expect("load");
        let template =
            load_str("_params_:\n  count: 1\n", SourceId::from("<test>")).expect("load");
        let mut templates = IndexMap::new();
        templates.insert("molecules/water".to_owned(), template);
        let loader = MapLoader(templates);
        let registry = GuardRegistry::empty();

        let outcome = expand(&body, &loader, &registry, &[], &IndexMap::new(), 0, "world")
            .expect("expand");
        let water = outcome.tree.get("water").expect("water instance");
        assert!(water.get("_params_").is_none());
    }

    #[test]
    fn ranged_instantiation_produces_indexed_instances() {
        let body = load_str(
            "_instantiate_:\n  water{i in 1..2}:\n    _template_: molecules/water\n",
            SourceId::from("<test>"),
        )
        .expect("load");
        let template = load_str("name: h2o\n", SourceId::from("<test>")).expect("load");
        let mut templates = IndexMap::new();
        templates.insert("molecules/water".to_owned(), template);
        let loader = MapLoader(templates);
        let registry = GuardRegistry::empty();

        let outcome = expand(&body, &loader, &registry, &[], &IndexMap::new(), 0, "world")
            .expect("expand");
        assert!(outcome.tree.get("water1").is_some());
        assert!(outcome.tree.get("water2").is_some());
    }

    #[test]
    fn modify_applies_after_instances_are_inserted() {
        let body = load_str(
            "items:\n  - a\n_modify_:\n  items:\n    _append_: b\n",
            SourceId::from("<test>"),
        )
        .expect("load");
        let loader = MapLoader(IndexMap::new());
        let registry = GuardRegistry::empty();
        let outcome = expand(&body, &loader, &registry, &[], &IndexMap::new(), 0, "world")
            .expect("expand");
        let items = outcome.tree.get("items").and_then(Node::as_sequence).expect("seq");
        assert_eq!(items.len(), 2);
    }
}
