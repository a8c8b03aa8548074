// crates/xenospec-experiment/src/spec.rs
// ============================================================================
// Module: XenoSpec Experiment Spec
// Description: The static content of one `experiment` entity: the scenario
// it targets, its axis map, exploration mode, and seed.
// Purpose: Implements the "Experiment" glossary entry and spec.md §4.9's
// enumeration inputs, read out of a hydrated `experiment` entity's body.
// Dependencies: indexmap, serde_json, xenospec-hydrate, xenospec-yaml
// ============================================================================

//! ## Overview
//! An [`ExperimentSpec`] is a read-only view over one hydrated `experiment`
//! entity's body, mirroring [`xenospec_session::Scenario`]'s relationship to
//! a hydrated `scenario` entity. It does not itself resolve the scenario
//! entity its `scenario_ref` names, nor construct simulators or agents —
//! that is the caller's concern (the CLI, which has the full hydrated
//! entity map and knows which concrete `Simulator`/`Agent` to build).

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use xenospec_hydrate::Entity;
use xenospec_yaml::Node;
use xenospec_yaml::NodeValue;
use xenospec_yaml::Scalar;

use crate::error::ExperimentError;

/// How an experiment's axis combinations are enumerated.
#[derive(Debug, Clone, PartialEq)]
pub enum Exploration {
    /// The full Cartesian product, in declared axis order.
    Iterate,
    /// `samples` combinations drawn at random.
    Sample {
        /// How many combinations to draw.
        samples: usize,
    },
}

/// The static content of one experiment, read out of its hydrated entity.
#[derive(Debug, Clone)]
pub struct ExperimentSpec {
    /// The experiment's dotted name.
    pub name: String,
    /// The dotted name of the scenario entity this experiment sweeps.
    pub scenario_ref: String,
    /// Axis name to its list of declared values, in declared order.
    pub axes: IndexMap<String, Vec<JsonValue>>,
    /// How axis combinations are enumerated.
    pub exploration: Exploration,
    /// The experiment-level seed per-run seeds are mixed from.
    pub seed: u64,
    /// Which keys of a run's final observable state to carry into its
    /// result record, if any are configured.
    pub record_keys: Vec<String>,
}

impl ExperimentSpec {
    /// Builds an [`ExperimentSpec`] from a hydrated `experiment` entity.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::MissingAxes`] if the entity's body has no
    /// `axes:` section, [`ExperimentError::EmptyAxis`] if a declared axis
    /// has no values, [`ExperimentError::UnknownExploration`] for an
    /// unrecognized `exploration` mode, or
    /// [`ExperimentError::MissingSampleCount`] for `exploration: sample`
    /// with no `samples` count.
    pub fn from_entity(entity: &Entity) -> Result<Self, ExperimentError> {
        let body = entity.body();
        let name = entity.name().to_owned();

        let Some(axes_node) = body.get("axes").and_then(Node::as_mapping) else {
            return Err(ExperimentError::MissingAxes { experiment: name });
        };
        let mut axes = IndexMap::new();
        for (axis_name, values_node) in axes_node {
            let Some(values) = values_node.as_sequence() else {
                return Err(ExperimentError::EmptyAxis { axis: axis_name.clone() });
            };
            if values.is_empty() {
                return Err(ExperimentError::EmptyAxis { axis: axis_name.clone() });
            }
            axes.insert(axis_name.clone(), values.iter().map(node_to_json).collect());
        }

        let exploration = parse_exploration(body)?;
        let scenario_ref = body.get("scenario").and_then(Node::as_str).unwrap_or("").to_owned();
        let seed = body.get("seed").and_then(node_as_u64).unwrap_or(0);
        let record_keys = body
            .get("record_keys")
            .and_then(Node::as_sequence)
            .map(|seq| seq.iter().filter_map(Node::as_str).map(str::to_owned).collect())
            .unwrap_or_default();

        Ok(ExperimentSpec {
            name,
            scenario_ref,
            axes,
            exploration,
            seed,
            record_keys,
        })
    }

    /// Every combination this experiment's `exploration` mode selects.
    /// Sampling uses a deterministic RNG derived from this experiment's own
    /// seed, so the same experiment body always draws the same rows.
    #[must_use]
    pub fn combinations(&self) -> crate::axis::SampleOutcome {
        match &self.exploration {
            Exploration::Iterate => crate::axis::SampleOutcome {
                rows: crate::axis::combinations(&self.axes),
                exact: true,
            },
            Exploration::Sample { samples } => {
                let mut rng = xenospec_eval::derive_rng(self.seed, "experiment.sample");
                crate::axis::sample(&self.axes, *samples, &mut rng)
            }
        }
    }
}

/// Parses the `exploration:`/`samples:` fields.
fn parse_exploration(body: &Node) -> Result<Exploration, ExperimentError> {
    let mode = body.get("exploration").and_then(Node::as_str).unwrap_or("iterate");
    match mode {
        "iterate" => Ok(Exploration::Iterate),
        "sample" => {
            let samples = body
                .get("samples")
                .and_then(node_as_u64)
                .ok_or(ExperimentError::MissingSampleCount)?;
            Ok(Exploration::Sample {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "sample counts are small, well within usize on any supported target"
                )]
                samples: samples as usize,
            })
        }
        other => Err(ExperimentError::UnknownExploration { mode: other.to_owned() }),
    }
}

/// Reads a node as `u64`, accepting an int scalar.
fn node_as_u64(node: &Node) -> Option<u64> {
    match &node.value {
        NodeValue::Scalar(Scalar::Int(i)) => u64::try_from(*i).ok(),
        _ => None,
    }
}

/// Converts a fully-resolved node into a [`serde_json::Value`], for an
/// axis's declared values.
fn node_to_json(node: &Node) -> JsonValue {
    match &node.value {
        NodeValue::Scalar(Scalar::Null) => JsonValue::Null,
        NodeValue::Scalar(Scalar::Bool(b)) => JsonValue::Bool(*b),
        NodeValue::Scalar(Scalar::Int(i)) => JsonValue::from(*i),
        NodeValue::Scalar(Scalar::Float(f)) => {
            serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
        }
        NodeValue::Scalar(Scalar::String(s)) => JsonValue::String(s.clone()),
        NodeValue::Mapping(m) => JsonValue::Object(m.iter().map(|(k, v)| (k.clone(), node_to_json(v))).collect()),
        NodeValue::Sequence(s) => JsonValue::Array(s.iter().map(node_to_json).collect()),
        NodeValue::Tag(t) => JsonValue::String(t.source().to_owned()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use xenospec_core::SourceId;
    use xenospec_hydrate::Entity;
    use xenospec_hydrate::TypeRegistry;
    use xenospec_hydrate::hydrate;
    use xenospec_scope::ScopeGraph;
    use xenospec_yaml::load_str;

    use super::Exploration;
    use super::ExperimentSpec;

    fn experiment_entity(body_yaml: &str) -> Entity {
        let indented: String = body_yaml
            .lines()
            .map(|line| if line.is_empty() { "\n".to_owned() } else { format!("  {line}\n") })
            .collect();
        let source = format!("experiment.trial:\n{indented}");
        let node = load_str(&source, SourceId::from("<test>")).expect("load");
        let (graph, root) = ScopeGraph::build(&node).expect("scope");
        let registry = TypeRegistry::with_builtins();
        let mut entities = hydrate(&node, root, &graph, &registry).expect("hydrate");
        entities.shift_remove("trial").expect("trial entity")
    }

    #[test]
    fn missing_axes_is_an_error() {
        let entity = experiment_entity("scenario: trial\n");
        assert!(ExperimentSpec::from_entity(&entity).is_err());
    }

    #[test]
    fn parses_iterate_axes_in_declared_order() {
        let entity = experiment_entity(
            "scenario: bioreactor_trial\naxes:\n  agent:\n    - A\n    - B\n  seed:\n    - 0\n    - 1\n",
        );
        let spec = ExperimentSpec::from_entity(&entity).expect("spec");
        assert_eq!(spec.exploration, Exploration::Iterate);
        assert_eq!(spec.axes.keys().collect::<Vec<_>>(), vec!["agent", "seed"]);
        let outcome = spec.combinations();
        assert_eq!(outcome.rows.len(), 4);
        assert!(outcome.exact);
    }

    #[test]
    fn sample_without_a_count_is_an_error() {
        let entity = experiment_entity(
            "scenario: bioreactor_trial\nexploration: sample\naxes:\n  agent:\n    - A\n    - B\n",
        );
        assert!(ExperimentSpec::from_entity(&entity).is_err());
    }
}
