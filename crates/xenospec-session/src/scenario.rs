// crates/xenospec-session/src/scenario.rs
// ============================================================================
// Module: XenoSpec Scenario
// Description: The static, already-built content a session is constructed
// from: briefing, constitution, interface catalog, limits, and scoring.
// Purpose: Implements the "hydrated scenario" spec.md §4.8 says a session
// receives on construction, read out of a hydrated `scenario` Entity's body.
// Dependencies: indexmap, xenospec-hydrate, xenospec-yaml
// ============================================================================

//! ## Overview
//! A [`Scenario`] is a read-only view over one hydrated `scenario` entity's
//! body. It does not evaluate anything: cost formulas and the termination
//! expression are kept as source text, evaluated lazily once a session has
//! a live scope (trace, population, budget) to evaluate them against.

use indexmap::IndexMap;
use xenospec_hydrate::Entity;
use xenospec_yaml::Node;
use xenospec_yaml::NodeValue;
use xenospec_yaml::Scalar;

use crate::action::ActionKind;
use crate::action::ActionSpec;
use crate::action::CostSpec;
use crate::error::SessionError;
use crate::params::GlobalParamOverrides;
use crate::params::GlobalParams;

/// A scenario's scoring configuration: the registered expressions plus
/// which one (if any) is canonical.
#[derive(Debug, Clone, Default)]
pub struct ScoringConfig {
    /// Name to Quoted-expression-source map of every registered scoring
    /// function.
    pub expressions: IndexMap<String, String>,
    /// Which registered expression (if any) is compared against
    /// `passing_score`.
    pub canonical: Option<String>,
    /// The threshold the canonical score must meet or exceed to pass.
    pub passing_score: Option<f64>,
}

/// The static content of one scenario, read out of its hydrated entity.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// The scenario's dotted name.
    pub name: String,
    /// Briefing text shown to the agent on the first observation.
    pub briefing: String,
    /// Normative constitution text.
    pub constitution: String,
    /// The interface catalog: every action and measurement the agent may
    /// submit.
    pub interface: IndexMap<String, ActionSpec>,
    /// Builtin defaults overlaid by this scenario's own `action.*`
    /// overrides.
    pub params: GlobalParams,
    /// Scoring configuration.
    pub scoring: ScoringConfig,
}

impl Scenario {
    /// Builds a [`Scenario`] from a hydrated `scenario` entity.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingInterface`] if the entity's body has
    /// no `interface:` section, or
    /// [`SessionError::MalformedInterfaceEntry`] if an entry cannot be
    /// parsed into an [`ActionSpec`].
    pub fn from_entity(entity: &Entity) -> Result<Self, SessionError> {
        let body = entity.body();
        let briefing = text_field(body, "briefing");
        let constitution = text_field(body, "constitution");

        let Some(interface_node) = body.get("interface") else {
            return Err(SessionError::MissingInterface {
                scenario: entity.name().to_owned(),
            });
        };
        let interface = parse_interface(interface_node)?;

        let overrides = parse_param_overrides(body);
        let params = GlobalParams::overlay(&overrides);
        let scoring = parse_scoring(body);

        Ok(Scenario {
            name: entity.name().to_owned(),
            briefing,
            constitution,
            interface,
            params,
            scoring,
        })
    }
}

/// Reads a top-level string field, defaulting to an empty string when
/// absent.
fn text_field(body: &Node, key: &str) -> String {
    body.get(key).and_then(Node::as_str).unwrap_or("").to_owned()
}

/// Parses `interface.actions`/`interface.measurements` into a flat catalog.
fn parse_interface(interface_node: &Node) -> Result<IndexMap<String, ActionSpec>, SessionError> {
    let mut catalog = IndexMap::new();
    if let Some(actions) = interface_node.get("actions").and_then(Node::as_mapping) {
        for (name, entry) in actions {
            catalog.insert(name.clone(), parse_action_spec(name, entry, ActionKind::Action)?);
        }
    }
    if let Some(measurements) = interface_node.get("measurements").and_then(Node::as_mapping) {
        for (name, entry) in measurements {
            catalog.insert(
                name.clone(),
                parse_action_spec(name, entry, ActionKind::Measurement)?,
            );
        }
    }
    Ok(catalog)
}

/// Parses one `interface.actions`/`interface.measurements` entry.
fn parse_action_spec(name: &str, entry: &Node, kind: ActionKind) -> Result<ActionSpec, SessionError> {
    let Some(mapping) = entry.as_mapping() else {
        return Err(SessionError::MalformedInterfaceEntry {
            name: name.to_owned(),
            message: "expected a mapping".to_owned(),
        });
    };

    let duration = mapping.get("duration").and_then(node_as_f64);
    let default_wait = mapping.get("wait").and_then(node_as_bool);

    let cost = match mapping.get("cost") {
        None => None,
        Some(cost_node) => Some(parse_cost_spec(name, cost_node)?),
    };

    let schema = mapping
        .get("params")
        .and_then(Node::as_mapping)
        .map(|m| m.iter().map(|(k, v)| (k.clone(), node_to_json(v))).collect())
        .unwrap_or_default();

    Ok(ActionSpec {
        name: name.to_owned(),
        kind,
        duration,
        cost,
        default_wait,
        schema,
    })
}

/// Parses a `cost:` field as either a constant number or a formula string.
fn parse_cost_spec(name: &str, node: &Node) -> Result<CostSpec, SessionError> {
    if let Some(v) = node_as_f64(node) {
        return Ok(CostSpec::Constant(v));
    }
    if let Some(s) = node.as_str() {
        return Ok(CostSpec::Formula(s.to_owned()));
    }
    Err(SessionError::MalformedInterfaceEntry {
        name: name.to_owned(),
        message: "`cost` must be a number or a formula string".to_owned(),
    })
}

/// Reads `action.timing`/`action.cost`/`action.limits` overrides from the
/// scenario body, per spec.md §6's global parameter table.
fn parse_param_overrides(body: &Node) -> GlobalParamOverrides {
    let action = body.get("action");
    let timing = action.and_then(|a| a.get("timing"));
    let cost = action.and_then(|a| a.get("cost"));
    let limits = action.and_then(|a| a.get("limits"));

    GlobalParamOverrides {
        default_wait: timing.and_then(|t| t.get("default_wait")).and_then(node_as_bool),
        initiation_time: timing.and_then(|t| t.get("initiation_time")).and_then(node_as_f64),
        default_duration: timing.and_then(|t| t.get("default_duration")).and_then(node_as_f64),
        steps_per_action: timing.and_then(|t| t.get("steps_per_action")).and_then(node_as_f64),
        default_action_cost: cost.and_then(|c| c.get("default_action")).and_then(node_as_f64),
        default_measurement_cost: cost
            .and_then(|c| c.get("default_measurement"))
            .and_then(node_as_f64),
        error_cost: cost.and_then(|c| c.get("error")).and_then(node_as_f64),
        max_steps: limits.and_then(|l| l.get("max_steps")).and_then(node_as_u64),
        max_sim_time: limits.and_then(|l| l.get("max_sim_time")).and_then(node_as_f64),
        budget: limits.and_then(|l| l.get("budget")).and_then(node_as_f64),
        wall_clock_timeout: limits
            .and_then(|l| l.get("wall_clock_timeout"))
            .and_then(node_as_f64),
        termination: limits
            .and_then(|l| l.get("termination"))
            .and_then(Node::as_tag)
            .map(|t| t.source().to_owned())
            .or_else(|| limits.and_then(|l| l.get("termination")).and_then(Node::as_str).map(str::to_owned)),
    }
}

/// Parses a `scoring:` section, if present.
fn parse_scoring(body: &Node) -> ScoringConfig {
    let Some(scoring_node) = body.get("scoring") else {
        return ScoringConfig::default();
    };
    let mut expressions = IndexMap::new();
    if let Some(mapping) = scoring_node.get("functions").and_then(Node::as_mapping) {
        for (name, expr_node) in mapping {
            let source = expr_node
                .as_tag()
                .map(|t| t.source().to_owned())
                .or_else(|| expr_node.as_str().map(str::to_owned));
            if let Some(source) = source {
                expressions.insert(name.clone(), source);
            }
        }
    }
    let canonical = scoring_node.get("canonical").and_then(Node::as_str).map(str::to_owned);
    let passing_score = scoring_node.get("passing_score").and_then(node_as_f64);
    ScoringConfig {
        expressions,
        canonical,
        passing_score,
    }
}

/// Reads a node as `f64`, accepting both int and float scalars.
fn node_as_f64(node: &Node) -> Option<f64> {
    match &node.value {
        NodeValue::Scalar(Scalar::Int(i)) => Some(*i as f64),
        NodeValue::Scalar(Scalar::Float(f)) => Some(*f),
        _ => None,
    }
}

/// Reads a node as `u64`, accepting an int scalar.
fn node_as_u64(node: &Node) -> Option<u64> {
    match &node.value {
        NodeValue::Scalar(Scalar::Int(i)) => u64::try_from(*i).ok(),
        _ => None,
    }
}

/// Reads a node as `bool`.
fn node_as_bool(node: &Node) -> Option<bool> {
    match &node.value {
        NodeValue::Scalar(Scalar::Bool(b)) => Some(*b),
        _ => None,
    }
}

/// Converts a fully-resolved node into a [`serde_json::Value`] for the
/// schema field carried on each [`ActionSpec`]. Any remaining `!ev`/`!_`
/// tag is rendered as its source text, since by the time a scenario is
/// constructed the build stage has already run.
fn node_to_json(node: &Node) -> serde_json::Value {
    match &node.value {
        NodeValue::Scalar(Scalar::Null) => serde_json::Value::Null,
        NodeValue::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
        NodeValue::Scalar(Scalar::Int(i)) => serde_json::Value::from(*i),
        NodeValue::Scalar(Scalar::Float(f)) => {
            serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        NodeValue::Scalar(Scalar::String(s)) => serde_json::Value::String(s.clone()),
        NodeValue::Mapping(m) => {
            serde_json::Value::Object(m.iter().map(|(k, v)| (k.clone(), node_to_json(v))).collect())
        }
        NodeValue::Sequence(s) => serde_json::Value::Array(s.iter().map(node_to_json).collect()),
        NodeValue::Tag(t) => serde_json::Value::String(t.source().to_owned()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use xenospec_core::SourceId;
    use xenospec_hydrate::hydrate;
    use xenospec_hydrate::Entity;
    use xenospec_hydrate::TypeRegistry;
    use xenospec_scope::ScopeGraph;
    use xenospec_yaml::load_str;

    use super::Scenario;
    use crate::action::ActionKind;

    /// Wraps `body_yaml` under a `scenario.trial:` key, scopes and hydrates
    /// it, and returns the resulting entity.
    fn scenario_entity(body_yaml: &str) -> Entity {
        let indented: String = body_yaml
            .lines()
            .map(|line| if line.is_empty() { "\n".to_owned() } else { format!("  {line}\n") })
            .collect();
        let source = format!("scenario.trial:\n{indented}");
        let node = load_str(&source, SourceId::from("<test>")).expect("load");
        let (graph, root) = ScopeGraph::build(&node).expect("scope");
        let registry = TypeRegistry::with_builtins();
        let mut entities = hydrate(&node, root, &graph, &registry).expect("hydrate");
        entities.shift_remove("trial").expect("trial entity")
    }

    #[test]
    fn missing_interface_is_an_error() {
        let entity = scenario_entity("briefing: hi\n");
        assert!(Scenario::from_entity(&entity).is_err());
    }

    #[test]
    fn parses_actions_and_measurements_with_overrides() {
        let entity = scenario_entity(
            "briefing: survive\ninterface:\n  actions:\n    add_feedstock:\n      cost: 1.0\n      duration: 0.5\n  measurements:\n    sample_ph:\n      cost: 0\n",
        );
        let scenario = Scenario::from_entity(&entity).expect("scenario");
        assert_eq!(scenario.interface.len(), 2);
        assert_eq!(scenario.interface["add_feedstock"].kind, ActionKind::Action);
        assert_eq!(scenario.interface["sample_ph"].kind, ActionKind::Measurement);
    }

    #[test]
    fn parses_limit_overrides() {
        let entity = scenario_entity(
            "interface:\n  actions: {}\naction:\n  limits:\n    budget: 1.5\n    max_steps: 10\n",
        );
        let scenario = Scenario::from_entity(&entity).expect("scenario");
        assert_eq!(scenario.params.budget, Some(1.5));
        assert_eq!(scenario.params.max_steps, 10);
    }
}
