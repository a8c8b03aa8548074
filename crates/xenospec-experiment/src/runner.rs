// crates/xenospec-experiment/src/runner.rs
// ============================================================================
// Module: XenoSpec Experiment Runner
// Description: Drives a Session to completion for every combination an
// experiment's axis sweep selects, and aggregates the result records.
// Purpose: Implements spec.md §4.9's "for each combination...construct a
// Session, run the agent loop to completion, and collect a result record".
// Dependencies: indexmap, rayon (optional, `parallel` feature),
// xenospec-session
// ============================================================================

//! ## Overview
//! [`run`] sequentially drives one [`Session`] per combination, exactly as
//! spec.md §5 requires for correctness. The `parallel` feature adds
//! [`run_parallel`], a `rayon`-backed fan-out over the same per-combination
//! work — spec.md §5 calls this a permitted but not required optimization,
//! since independent sessions share no mutable state beyond the read-only
//! scenario they are each given their own clone of.
//!
//! Both variants take a `build_run` callback rather than owning simulator or
//! agent construction themselves: what a concrete `Simulator`/`Agent` pair
//! looks like for a given combination is scenario-specific and lives outside
//! this crate.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use xenospec_session::Agent;
use xenospec_session::ScoreReport;
use xenospec_session::Scenario;
use xenospec_session::Session;
use xenospec_session::Simulator;

use crate::axis::Combination;
use crate::error::ExperimentError;
use crate::seed::derive_run_seed;
use crate::spec::Exploration;
use crate::spec::ExperimentSpec;

/// One combination's result: its axis values, the per-run seed it was
/// driven with, its scores, and any configured final-state keys.
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// The axis values this run was driven with.
    pub combination: Combination,
    /// The per-run seed derived for this combination.
    pub seed: u64,
    /// Every registered scoring expression's result, by name.
    pub scores: IndexMap<String, f64>,
    /// The canonical score, if one is registered.
    pub canonical_score: Option<f64>,
    /// Whether this run is considered a success: the session terminated
    /// other than by wall-clock timeout, and — when a canonical score and
    /// `passing_score` are both configured — the canonical score met it.
    pub success: bool,
    /// The configured subset of the run's final observable state.
    pub final_state: IndexMap<String, JsonValue>,
}

/// The full result of driving an experiment's combination sweep.
#[derive(Debug, Clone, Default)]
pub struct ExperimentOutcome {
    /// One record per combination, in the order the sweep selected them.
    pub records: Vec<RunRecord>,
    /// Human-readable notes about anything the sweep could not satisfy
    /// exactly (spec.md §4.9 Open Question: when `samples` exceeds the
    /// Cartesian product's size, sampling falls back to drawing with
    /// replacement rather than silently truncating the requested count).
    pub diagnostics: Vec<String>,
}

/// Drives one [`Session`] per combination, sequentially, to completion.
///
/// # Errors
///
/// Returns [`ExperimentError::RunFailed`] if any run's session raises a
/// [`xenospec_session::SessionError`] evaluating a cost, termination, or
/// scoring expression.
pub fn run<S, A>(
    spec: &ExperimentSpec,
    scenario: &Scenario,
    mut build_run: impl FnMut(&Combination, u64) -> (S, A),
) -> Result<ExperimentOutcome, ExperimentError>
where
    S: Simulator,
    A: Agent,
{
    let (rows, diagnostics) = select_rows(spec);
    let mut records = Vec::with_capacity(rows.len());
    for (index, combination) in rows.iter().enumerate() {
        let seed = derive_run_seed(spec.seed, index);
        let (simulator, mut agent) = build_run(combination, seed);
        let mut session = Session::new(scenario.clone(), simulator, seed);
        let score = session
            .run_to_completion(&mut agent)
            .map_err(|source| ExperimentError::RunFailed { index, source })?;
        records.push(build_record(combination.clone(), seed, &session, score, &spec.record_keys));
    }
    Ok(ExperimentOutcome { records, diagnostics })
}

/// Selects this experiment's combination rows and notes whether sampling
/// had to fall back to drawing with replacement.
fn select_rows(spec: &ExperimentSpec) -> (Vec<Combination>, Vec<String>) {
    let outcome = spec.combinations();
    let mut diagnostics = Vec::new();
    if !outcome.exact {
        if let Exploration::Sample { samples } = &spec.exploration {
            let available = crate::axis::combinations(&spec.axes).len();
            diagnostics.push(format!(
                "requested {samples} samples exceeds the {available} distinct combinations available; sampled with replacement"
            ));
        }
    }
    (outcome.rows, diagnostics)
}

/// Builds one [`RunRecord`] from a completed (or abandoned) session.
fn build_record<S: Simulator>(
    combination: Combination,
    seed: u64,
    session: &Session<S>,
    score: Option<ScoreReport>,
    record_keys: &[String],
) -> RunRecord {
    let observable = session.observe().observable_state;
    let mut final_state = IndexMap::new();
    if let Some(object) = observable.as_object() {
        for key in record_keys {
            if let Some(value) = object.get(key) {
                final_state.insert(key.clone(), value.clone());
            }
        }
    }

    let (scores, canonical_score, success) = match score {
        Some(report) => {
            let success = report.pass.unwrap_or(true);
            (report.scores, report.canonical_score, success)
        }
        None => (IndexMap::new(), None, false),
    };

    RunRecord {
        combination,
        seed,
        scores,
        canonical_score,
        success,
        final_state,
    }
}

#[cfg(feature = "parallel")]
mod parallel {
    //! A `rayon`-backed fan-out over the same per-combination work `run`
    //! does sequentially. Independent sessions share no mutable state
    //! beyond the read-only `scenario` each is given its own clone of
    //! (spec.md §5), so this is a correctness-preserving optimization, not
    //! a different algorithm.

    use rayon::prelude::IndexedParallelIterator;
    use rayon::prelude::IntoParallelRefIterator;
    use rayon::prelude::ParallelIterator;

    use super::ExperimentError;
    use super::ExperimentOutcome;
    use super::build_record;
    use super::derive_run_seed;
    use super::select_rows;
    use crate::axis::Combination;
    use crate::spec::ExperimentSpec;
    use xenospec_session::Agent;
    use xenospec_session::Scenario;
    use xenospec_session::Session;
    use xenospec_session::Simulator;

    /// The `parallel`-feature counterpart to [`super::run`]: identical
    /// selection and per-run semantics, fanned out across a `rayon` thread
    /// pool instead of driven one combination at a time.
    ///
    /// # Errors
    ///
    /// Returns [`ExperimentError::RunFailed`] under the same conditions as
    /// [`super::run`].
    pub fn run_parallel<S, A>(
        spec: &ExperimentSpec,
        scenario: &Scenario,
        build_run: impl Fn(&Combination, u64) -> (S, A) + Sync,
    ) -> Result<ExperimentOutcome, ExperimentError>
    where
        S: Simulator + Send,
        A: Agent + Send,
    {
        let (rows, diagnostics) = select_rows(spec);
        let records = rows
            .par_iter()
            .enumerate()
            .map(|(index, combination)| {
                let seed = derive_run_seed(spec.seed, index);
                let (simulator, mut agent) = build_run(combination, seed);
                let mut session = Session::new(scenario.clone(), simulator, seed);
                let score = session
                    .run_to_completion(&mut agent)
                    .map_err(|source| ExperimentError::RunFailed { index, source })?;
                Ok(build_record(combination.clone(), seed, &session, score, &spec.record_keys))
            })
            .collect::<Result<Vec<_>, ExperimentError>>()?;
        Ok(ExperimentOutcome { records, diagnostics })
    }
}

#[cfg(feature = "parallel")]
pub use parallel::run_parallel;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "tests use unwrap_used/expect_used on deterministic fixtures")]
    use std::collections::HashMap;

    use indexmap::IndexMap;
    use serde_json::Value;
    use serde_json::json;
    use xenospec_session::Action;
    use xenospec_session::ActionKind;
    use xenospec_session::ActionResult;
    use xenospec_session::ActionSpec;
    use xenospec_session::CostSpec;
    use xenospec_session::GlobalParamOverrides;
    use xenospec_session::GlobalParams;
    use xenospec_session::ScoringConfig;
    use xenospec_session::SimulatorError;

    use super::run;
    use crate::spec::Exploration;
    use crate::spec::ExperimentSpec;

    struct CountingSimulator {
        time: f64,
    }
    impl Simulator for CountingSimulator {
        fn time(&self) -> f64 {
            self.time
        }
        fn advance(&mut self, delta: f64) {
            self.time += delta;
        }
        fn execute(&mut self, name: &str, _params: &Value) -> Result<Value, SimulatorError> {
            Ok(json!({ "name": name }))
        }
        fn schedule(&mut self, _name: &str, _params: &Value, _duration: f64) {}
        fn observable_state(&self) -> Value {
            json!({ "time": self.time })
        }
        fn is_terminal(&self) -> bool {
            false
        }
        fn population(&self, _species: &str) -> Option<f64> {
            None
        }
    }

    struct OneShotAgent {
        submitted: bool,
    }
    impl Agent for OneShotAgent {
        fn start(&mut self, _briefing: &str, _initial_state: &Value) {}
        fn decide(&mut self, _observable_state: &Value) -> Option<Action> {
            if self.submitted {
                None
            } else {
                self.submitted = true;
                Some(Action {
                    name: "add_feedstock".to_owned(),
                    params: json!({}),
                    kind: ActionKind::Action,
                    wait: None,
                })
            }
        }
        fn observe_result(&mut self, _result: &ActionResult) {}
        fn end(&mut self, _final_state: &Value, _score: Option<f64>) {}
    }

    fn scenario_fixture() -> Scenario {
        let mut interface = IndexMap::new();
        interface.insert(
            "add_feedstock".to_owned(),
            ActionSpec {
                name: "add_feedstock".to_owned(),
                kind: ActionKind::Action,
                duration: Some(0.1),
                cost: Some(CostSpec::Constant(1.0)),
                default_wait: None,
                schema: IndexMap::new(),
            },
        );
        Scenario {
            name: "trial".to_owned(),
            briefing: "survive".to_owned(),
            constitution: String::new(),
            interface,
            params: GlobalParams::overlay(&GlobalParamOverrides::default()),
            scoring: ScoringConfig::default(),
        }
    }

    fn experiment_fixture() -> ExperimentSpec {
        let mut axes = IndexMap::new();
        axes.insert("agent".to_owned(), vec![json!("A"), json!("B")]);
        ExperimentSpec {
            name: "trial".to_owned(),
            scenario_ref: "trial".to_owned(),
            axes,
            exploration: Exploration::Iterate,
            seed: 11,
            record_keys: vec!["time".to_owned()],
        }
    }

    #[test]
    fn drives_one_session_per_combination() {
        let spec = experiment_fixture();
        let scenario = scenario_fixture();
        let seeds_seen = std::sync::Mutex::new(HashMap::new());
        let outcome = run(&spec, &scenario, |combination, seed| {
            seeds_seen
                .lock()
                .expect("lock")
                .insert(combination["agent"].as_str().unwrap().to_owned(), seed);
            (CountingSimulator { time: 0.0 }, OneShotAgent { submitted: false })
        })
        .expect("run");

        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.diagnostics.is_empty());
        assert!(outcome.records[0].success);
        assert!(outcome.records[0].final_state.contains_key("time"));
        assert_eq!(seeds_seen.lock().expect("lock").len(), 2);
    }
}
