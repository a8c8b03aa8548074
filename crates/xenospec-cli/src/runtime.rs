// crates/xenospec-cli/src/runtime.rs
// ============================================================================
// Module: XenoSpec CLI Reference Runtime
// Description: A minimal, built-in Simulator/Agent pair so `run` and
// `experiment` are drivable end to end without a real biochemical model or
// language-model-backed decision loop.
// Purpose: `Simulator`/`Agent` are deliberately abstract collaborators
// (spec.md §1); this module supplies the smallest concrete pair that still
// exercises the full observation/action contract, not a stand-in for either.
// Dependencies: serde, serde_json, xenospec-session
// ============================================================================

//! ## Overview
//! [`NullSimulator`] executes every action by echoing its name and params
//! back as observation data; it never fails an action and is only terminal
//! when told to be. [`ScriptedAgent`] plays back a fixed, ordered list of
//! actions read from a JSON file and ends the episode once the list is
//! exhausted — a scripted policy, in the same sense spec.md §1 uses the term
//! for "agent under evaluation".

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::json;
use serde_json::Value;
use thiserror::Error;
use xenospec_session::Action;
use xenospec_session::ActionKind;
use xenospec_session::ActionResult;
use xenospec_session::Agent;
use xenospec_session::Simulator;
use xenospec_session::SimulatorError;

/// A simulator with no model behind it: every action succeeds, observable
/// state is just the clock and any seeded populations, and it is terminal
/// only when constructed that way.
#[derive(Debug, Clone, Default)]
pub struct NullSimulator {
    time: f64,
    populations: HashMap<String, f64>,
    terminal: bool,
}

impl NullSimulator {
    /// Builds a simulator starting at `time = 0.0` with no populations and
    /// no terminal condition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a simulator seeded with named populations, read from a flat
    /// JSON object such as `{"prey": 40.0, "predator": 6.0}`.
    #[must_use]
    pub fn with_populations(populations: HashMap<String, f64>) -> Self {
        Self {
            populations,
            ..Self::default()
        }
    }
}

impl Simulator for NullSimulator {
    fn time(&self) -> f64 {
        self.time
    }

    fn advance(&mut self, delta: f64) {
        self.time += delta;
    }

    fn execute(&mut self, name: &str, params: &Value) -> Result<Value, SimulatorError> {
        Ok(json!({ "action": name, "params": params }))
    }

    fn schedule(&mut self, _name: &str, _params: &Value, _duration: f64) {}

    fn observable_state(&self) -> Value {
        json!({
            "time": self.time,
            "populations": self.populations,
        })
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn population(&self, species: &str) -> Option<f64> {
        self.populations.get(species).copied()
    }
}

/// One entry of a [`ScriptedAgent`]'s action script.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedStep {
    /// The action or measurement name, looked up against the scenario's
    /// interface catalog by [`xenospec_session::Session::act`].
    pub name: String,
    /// Parameters passed through verbatim.
    #[serde(default)]
    pub params: Value,
    /// `"action"` (the default) or `"measurement"`.
    #[serde(default)]
    pub kind: Option<String>,
    /// An explicit per-step wait override.
    #[serde(default)]
    pub wait: Option<bool>,
}

/// Errors raised loading a [`ScriptedAgent`]'s script file.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script file could not be read.
    #[error("failed to read script at {path}: {source}")]
    Io {
        /// The script path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The script file's JSON could not be parsed into a step list.
    #[error("failed to parse script at {path}: {source}")]
    Parse {
        /// The script path.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// An agent that plays back a fixed, ordered list of actions and then ends
/// the episode.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAgent {
    steps: std::collections::VecDeque<ScriptedStep>,
    results: Vec<ActionResult>,
}

impl ScriptedAgent {
    /// Builds an agent with no scripted actions; it ends the episode on its
    /// very first `decide`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds an agent from an in-memory step list, in playback order.
    #[must_use]
    pub fn from_steps(steps: Vec<ScriptedStep>) -> Self {
        Self {
            steps: steps.into(),
            results: Vec::new(),
        }
    }

    /// Loads a script from a JSON file containing an array of
    /// [`ScriptedStep`] entries.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Io`] or [`ScriptError::Parse`] as appropriate.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let steps: Vec<ScriptedStep> = serde_json::from_str(&text).map_err(|source| ScriptError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_steps(steps))
    }

    /// Every result this agent has observed so far, in submission order.
    #[must_use]
    pub fn results(&self) -> &[ActionResult] {
        &self.results
    }
}

impl Agent for ScriptedAgent {
    fn start(&mut self, _briefing: &str, _initial_state: &Value) {}

    fn decide(&mut self, _observable_state: &Value) -> Option<Action> {
        let step = self.steps.pop_front()?;
        let kind = match step.kind.as_deref() {
            Some("measurement") => ActionKind::Measurement,
            _ => ActionKind::Action,
        };
        Some(Action {
            name: step.name,
            params: step.params,
            kind,
            wait: step.wait,
        })
    }

    fn observe_result(&mut self, result: &ActionResult) {
        self.results.push(result.clone());
    }

    fn end(&mut self, _final_state: &Value, _score: Option<f64>) {}
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use serde_json::json;

    use super::NullSimulator;
    use super::ScriptedAgent;
    use super::Simulator;
    use xenospec_session::Agent;

    #[test]
    fn null_simulator_echoes_executed_actions() {
        let mut sim = NullSimulator::new();
        let result = sim.execute("add_feedstock", &json!({"amount": 2})).expect("execute");
        assert_eq!(result["action"], "add_feedstock");
        sim.advance(1.0);
        assert_eq!(sim.time(), 1.0);
        assert!(!sim.is_terminal());
    }

    #[test]
    fn scripted_agent_plays_back_then_ends() {
        let mut agent = ScriptedAgent::from_steps(vec![super::ScriptedStep {
            name: "add_feedstock".to_owned(),
            params: json!({}),
            kind: None,
            wait: None,
        }]);
        let state = json!({});
        agent.start("briefing", &state);
        let first = agent.decide(&state).expect("first action");
        assert_eq!(first.name, "add_feedstock");
        assert!(agent.decide(&state).is_none());
    }
}
