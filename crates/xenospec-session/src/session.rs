// crates/xenospec-session/src/session.rs
// ============================================================================
// Module: XenoSpec Session
// Description: The deterministic, step-driven session mediating between an
// agent and a simulator.
// Purpose: Implements spec.md §4.8 end to end: the observation contract, the
// action contract, termination precedence, and scoring.
// Dependencies: indexmap, serde_json, xenospec-eval
// ============================================================================

//! ## Overview
//! [`Session`] owns a [`Scenario`], a [`Simulator`] instance, a [`Timeline`],
//! a step counter, a cost accumulator, and a seed. It is the only thing an
//! [`Agent`] talks to: `observe`/`act` form the whole agent-facing contract,
//! and [`Session::is_done`]/[`Session::score`] close out an episode per
//! spec.md §4.8.3/§4.8.4.
//!
//! This module does not drive the agent loop itself beyond
//! [`Session::run_to_completion`] — constructing an agent and deciding how
//! many episodes to run is the caller's concern (a single-session CLI
//! invocation, or the experiment runner iterating over axis combinations).

use indexmap::IndexMap;
use serde_json::Value;
use serde_json::json;

use crate::action::Action;
use crate::action::ActionKind;
use crate::action::ActionResult;
use crate::action::ActionSpec;
use crate::action::CostSpec;
use crate::agent::Agent;
use crate::error::SessionError;
use crate::resolver::ParamsResolver;
use crate::scenario::Scenario;
use crate::scoring::EmptyScoringResolver;
use crate::scoring::ScoringScope;
use crate::simulator::Simulator;
use crate::timeline::Event;
use crate::timeline::EventKind;
use crate::timeline::Timeline;

/// Why a session stopped, in the precedence order spec.md §4.8.3 checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The agent voluntarily ended the episode (condition 1).
    AgentDone,
    /// `step_count` reached `action.limits.max_steps` (condition 2).
    MaxSteps,
    /// `spent` reached `action.limits.budget` (condition 3).
    BudgetExceeded,
    /// `simulator.time` reached `action.limits.max_sim_time` (condition 4).
    MaxSimTime,
    /// The scenario's termination expression evaluated to `true` (condition 5).
    ScenarioTermination,
    /// The simulator reported its own terminal condition (condition 6).
    SimulatorTerminal,
    /// A wall-clock timeout abandoned the session out of band.
    WallClockTimeout,
}

/// A read-only snapshot of the session's observable state, returned by
/// [`Session::observe`].
#[derive(Debug, Clone)]
pub struct Observation<'a> {
    /// The scenario's briefing text.
    pub briefing: &'a str,
    /// The scenario's normative constitution text.
    pub constitution: &'a str,
    /// The catalog of actions and measurements the agent may submit.
    pub interface: &'a IndexMap<String, ActionSpec>,
    /// The simulator's current observable state.
    pub observable_state: Value,
    /// The current step count.
    pub step: u64,
    /// The active budget ceiling, if any.
    pub budget: Option<f64>,
    /// The cost spent so far.
    pub spent: f64,
    /// `budget - spent`, if a budget is configured.
    pub remaining: Option<f64>,
}

/// The outcome of evaluating every registered scoring expression once a
/// session has terminated cleanly.
#[derive(Debug, Clone, Default)]
pub struct ScoreReport {
    /// Every registered scoring expression's numeric result, by name.
    pub scores: IndexMap<String, f64>,
    /// The canonical score, if one is registered.
    pub canonical_score: Option<f64>,
    /// Whether the canonical score met `passing_score`.
    pub pass: Option<bool>,
}

/// A deterministic, step-driven session mediating between an agent and a
/// simulator.
///
/// # Invariants
/// - `timeline` events are monotonic non-decreasing in `time`.
/// - `spent` equals the sum of `cost` fields across every `result`/
///   `completed` event.
pub struct Session<S: Simulator> {
    scenario: Scenario,
    simulator: S,
    timeline: Timeline,
    step_count: u64,
    spent: f64,
    seed: u64,
    agent_done: bool,
    termination: Option<TerminationReason>,
}

impl<S: Simulator> Session<S> {
    /// Constructs a session from a hydrated scenario, a simulator instance,
    /// and a seed.
    #[must_use]
    pub fn new(scenario: Scenario, simulator: S, seed: u64) -> Self {
        Session {
            scenario,
            simulator,
            timeline: Timeline::new(),
            step_count: 0,
            spent: 0.0,
            seed,
            agent_done: false,
            termination: None,
        }
    }

    /// The session's seed, for deriving a scoring expression's RNG
    /// substream should a registered helper ever need one.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The underlying scenario.
    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Timeline events since index `since`, for the polling primitive
    /// spec.md §4.8.1 requires.
    #[must_use]
    pub fn events_since(&self, since: usize) -> &[Event] {
        self.timeline.events_since(since)
    }

    /// Returns a read-only snapshot of the session's observable state.
    #[must_use]
    pub fn observe(&self) -> Observation<'_> {
        let budget = self.scenario.params.budget;
        Observation {
            briefing: &self.scenario.briefing,
            constitution: &self.scenario.constitution,
            interface: &self.scenario.interface,
            observable_state: self.simulator.observable_state(),
            step: self.step_count,
            budget,
            spent: self.spent,
            remaining: budget.map(|b| b - self.spent),
        }
    }

    /// Submits one action to the session, implementing spec.md §4.8.2's
    /// eight-step execution semantics.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Terminated`] if the session has already
    /// terminated, or a cost-formula evaluation error propagated from
    /// [`crate::scoring`]'s shared expression machinery.
    pub fn act(&mut self, action: Action) -> Result<ActionResult, SessionError> {
        if self.is_done() {
            let reason = self
                .termination
                .clone()
                .or_else(|| self.check_termination())
                .as_ref()
                .map_or_else(|| "session has terminated".to_owned(), describe_termination);
            return Err(SessionError::Terminated { reason });
        }

        self.step_count += 1;

        let spec = self.scenario.interface.get(&action.name).cloned();
        let now = self.simulator.time();

        self.timeline.push(Event {
            time: now,
            kind: EventKind::Action,
            payload: json!({ "name": action.name, "params": action.params, "wait": action.wait }),
        });

        let Some(spec) = spec else {
            self.simulator.advance(self.scenario.params.initiation_time);
            let result = ActionResult::unknown_action(&action.name, self.scenario.params.error_cost);
            self.timeline.push(Event {
                time: self.simulator.time(),
                kind: EventKind::Result,
                payload: result_payload(&result),
            });
            self.spent += result.cost;
            self.drain_due_completions();
            return Ok(result);
        };

        self.simulator.advance(self.scenario.params.initiation_time);

        let duration = spec.duration.unwrap_or(self.scenario.params.default_duration);
        let cost = self.resolve_cost(&spec, &action.params)?;
        let wait = action
            .wait
            .or(spec.default_wait)
            .unwrap_or(self.scenario.params.default_wait);

        if spec.kind == ActionKind::Measurement && !wait {
            let result = ActionResult {
                success: false,
                cost: self.scenario.params.error_cost,
                data: Value::Null,
                error: Some(format!("measurement `{}` cannot be deferred", action.name)),
                completed: true,
                completion_time: None,
            };
            self.timeline.push(Event {
                time: self.simulator.time(),
                kind: EventKind::Result,
                payload: result_payload(&result),
            });
            self.spent += result.cost;
            self.drain_due_completions();
            return Ok(result);
        }

        let result = if wait {
            self.simulator.advance(duration);
            let outcome = self.simulator.execute(&action.name, &action.params);
            let result = match outcome {
                Ok(data) => ActionResult {
                    success: true,
                    cost,
                    data,
                    error: None,
                    completed: true,
                    completion_time: None,
                },
                Err(err) => ActionResult {
                    success: false,
                    cost,
                    data: Value::Null,
                    error: Some(err.to_string()),
                    completed: true,
                    completion_time: None,
                },
            };
            self.timeline.push(Event {
                time: self.simulator.time(),
                kind: EventKind::Result,
                payload: result_payload(&result),
            });
            self.spent += result.cost;
            if spec.kind == ActionKind::Action {
                self.simulator.advance(self.scenario.params.steps_per_action);
            }
            result
        } else {
            self.simulator.schedule(&action.name, &action.params, duration);
            let completion_time = self.simulator.time() + duration;
            self.timeline.schedule_completion(
                action.name.clone(),
                action.params.clone(),
                spec.kind,
                completion_time,
            );
            self.timeline.push(Event {
                time: self.simulator.time(),
                kind: EventKind::Initiated,
                payload: json!({
                    "name": action.name,
                    "params": action.params,
                    "completion_time": completion_time,
                }),
            });
            ActionResult {
                success: true,
                cost: 0.0,
                data: Value::Null,
                error: None,
                completed: false,
                completion_time: Some(completion_time),
            }
        };

        self.drain_due_completions();
        Ok(result)
    }

    /// Resolves the effective cost for `spec` given `params`: a constant,
    /// an evaluated formula, or the global default for its kind.
    fn resolve_cost(&self, spec: &ActionSpec, params: &Value) -> Result<f64, SessionError> {
        match &spec.cost {
            Some(CostSpec::Constant(value)) => Ok(*value),
            Some(CostSpec::Formula(source)) => {
                let resolver = ParamsResolver::new(params);
                let value = xenospec_eval::evaluate_str(source, &resolver, self.seed, &spec.name)
                    .map_err(|err| SessionError::ExpressionEval {
                        source_text: source.clone(),
                        source: err,
                    })?;
                value.as_f64().map_err(|err| SessionError::ExpressionEval {
                    source_text: source.clone(),
                    source: err,
                })
            }
            None => Ok(match spec.kind {
                ActionKind::Action => self.scenario.params.default_action_cost,
                ActionKind::Measurement => self.scenario.params.default_measurement_cost,
            }),
        }
    }

    /// Drains every pending concurrent action whose completion time has
    /// arrived, executing its effect and appending a `completed` event
    /// (spec.md §4.8.2 step 8).
    fn drain_due_completions(&mut self) {
        let now = self.simulator.time();
        let scenario = &self.scenario;
        let mut charged = Vec::new();

        let mut due = Vec::new();
        self.timeline.drain_ready(now, |name, params, kind, completion_time| {
            due.push((name.to_owned(), params.clone(), kind, completion_time));
        });

        for (name, params, kind, completion_time) in due {
            let spec = scenario.interface.get(&name).cloned();
            let cost = spec
                .as_ref()
                .map_or(scenario.params.error_cost, |spec| {
                    match &spec.cost {
                        Some(CostSpec::Constant(value)) => *value,
                        Some(CostSpec::Formula(source)) => {
                            let resolver = ParamsResolver::new(&params);
                            xenospec_eval::evaluate_str(source, &resolver, self.seed, &name)
                                .ok()
                                .and_then(|v| v.as_f64().ok())
                                .unwrap_or(scenario.params.error_cost)
                        }
                        None => match kind {
                            ActionKind::Action => scenario.params.default_action_cost,
                            ActionKind::Measurement => scenario.params.default_measurement_cost,
                        },
                    }
                });
            let outcome = self.simulator.execute(&name, &params);
            let payload = match outcome {
                Ok(data) => json!({ "success": true, "cost": cost, "data": data, "error": Value::Null }),
                Err(err) => {
                    json!({ "success": false, "cost": cost, "data": Value::Null, "error": err.to_string() })
                }
            };
            charged.push((completion_time, cost, payload));
        }

        for (time, cost, payload) in charged {
            self.timeline.push(Event {
                time,
                kind: EventKind::Completed,
                payload,
            });
            self.spent += cost;
        }
    }

    /// Marks the episode as voluntarily ended by the agent (spec.md
    /// §4.8.3 condition 1).
    pub fn mark_agent_done(&mut self) {
        self.agent_done = true;
    }

    /// Drains every still-pending concurrent action regardless of whether
    /// its completion time has been reached yet, advancing the simulator to
    /// each completion in turn.
    ///
    /// spec.md §5: "premature termination... drains pending completions and
    /// then stops"; the Pairing testable property (§8) requires every
    /// `initiated` event to get a matching `completed` event. Called before
    /// scoring on every termination path, not only the agent-done path,
    /// since budget/step/sim-time/scenario/simulator termination can all fire
    /// while concurrent actions are still outstanding.
    fn flush_pending_completions(&mut self) {
        while let Some(completion_time) = self.timeline.next_completion_time() {
            if completion_time > self.simulator.time() {
                self.simulator.advance(completion_time - self.simulator.time());
            }
            self.drain_due_completions();
        }
    }

    /// Checks the six termination conditions in their documented
    /// precedence order, returning the first that holds.
    #[must_use]
    pub fn check_termination(&self) -> Option<TerminationReason> {
        if self.agent_done {
            return Some(TerminationReason::AgentDone);
        }
        if self.step_count >= self.scenario.params.max_steps {
            return Some(TerminationReason::MaxSteps);
        }
        if let Some(budget) = self.scenario.params.budget {
            if self.spent >= budget {
                return Some(TerminationReason::BudgetExceeded);
            }
        }
        if let Some(max_sim_time) = self.scenario.params.max_sim_time {
            if self.simulator.time() >= max_sim_time {
                return Some(TerminationReason::MaxSimTime);
            }
        }
        if let Some(source) = &self.scenario.params.termination {
            if self.evaluate_termination(source).unwrap_or(false) {
                return Some(TerminationReason::ScenarioTermination);
            }
        }
        if self.simulator.is_terminal() {
            return Some(TerminationReason::SimulatorTerminal);
        }
        None
    }

    /// Evaluates the scenario's termination expression against the current
    /// trace/population/budget scope.
    fn evaluate_termination(&self, source: &str) -> Result<bool, SessionError> {
        let population = |species: &str| self.simulator.population(species);
        let scope = ScoringScope {
            timeline: &self.timeline,
            population: &population,
            spent: self.spent,
            budget: self.scenario.params.budget,
            resolver: &EmptyScoringResolver,
        };
        Ok(crate::scoring::evaluate(source, &scope)?.is_truthy())
    }

    /// Returns `true` if any termination condition holds.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.termination.is_some() || self.check_termination().is_some()
    }

    /// Abandons the session due to a wall-clock timeout, out of band from
    /// the six in-session termination conditions. No scores are computed
    /// for a session ended this way (spec.md §4.8.3).
    pub fn abandon_timeout(&mut self) {
        self.termination = Some(TerminationReason::WallClockTimeout);
    }

    /// The reason the session stopped, if it has.
    #[must_use]
    pub fn termination_reason(&self) -> Option<&TerminationReason> {
        self.termination.as_ref()
    }

    /// Drives `agent` to completion: observes, decides, acts, and repeats
    /// until [`Session::is_done`]. Returns the final score report, unless
    /// the session ended via [`Session::abandon_timeout`].
    ///
    /// # Errors
    ///
    /// Propagates any [`SessionError`] raised evaluating a cost formula,
    /// the termination expression, or a scoring expression.
    pub fn run_to_completion<A: Agent>(&mut self, agent: &mut A) -> Result<Option<ScoreReport>, SessionError> {
        let observation = self.observe();
        agent.start(observation.briefing, &observation.observable_state);

        while !self.is_done() {
            let observable_state = self.observe().observable_state;
            let Some(action) = agent.decide(&observable_state) else {
                self.mark_agent_done();
                break;
            };
            let result = self.act(action)?;
            agent.observe_result(&result);
        }
        self.termination = self.termination.take().or_else(|| self.check_termination());

        let score = if matches!(self.termination, Some(TerminationReason::WallClockTimeout)) {
            None
        } else {
            self.flush_pending_completions();
            Some(self.score()?)
        };

        let final_state = self.simulator.observable_state();
        agent.end(&final_state, score.as_ref().and_then(|s| s.canonical_score));
        Ok(score)
    }

    /// Evaluates every registered scoring expression against the trace and
    /// scenario (spec.md §4.8.4).
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if a registered scoring expression fails
    /// to evaluate.
    pub fn score(&self) -> Result<ScoreReport, SessionError> {
        let population = |species: &str| self.simulator.population(species);
        let scope = ScoringScope {
            timeline: &self.timeline,
            population: &population,
            spent: self.spent,
            budget: self.scenario.params.budget,
            resolver: &EmptyScoringResolver,
        };

        let mut scores = IndexMap::new();
        for (name, source) in &self.scenario.scoring.expressions {
            let value = crate::scoring::evaluate(source, &scope)?;
            scores.insert(name.clone(), value.as_f64().unwrap_or(0.0));
        }

        let canonical_score = self
            .scenario
            .scoring
            .canonical
            .as_ref()
            .and_then(|name| scores.get(name).copied());
        let pass = match (canonical_score, self.scenario.scoring.passing_score) {
            (Some(score), Some(threshold)) => Some(score >= threshold),
            _ => None,
        };

        Ok(ScoreReport {
            scores,
            canonical_score,
            pass,
        })
    }
}

/// Renders `reason` as the short diagnostic text `act()` reports once a
/// session has terminated.
fn describe_termination(reason: &TerminationReason) -> String {
    match reason {
        TerminationReason::AgentDone => "agent submitted done".to_owned(),
        TerminationReason::MaxSteps => "max steps reached".to_owned(),
        TerminationReason::BudgetExceeded => "budget exceeded".to_owned(),
        TerminationReason::MaxSimTime => "max sim time reached".to_owned(),
        TerminationReason::ScenarioTermination => "scenario termination condition met".to_owned(),
        TerminationReason::SimulatorTerminal => "simulator reported a terminal condition".to_owned(),
        TerminationReason::WallClockTimeout => "wall-clock timeout".to_owned(),
    }
}

/// Renders an [`ActionResult`] as the JSON payload recorded on a
/// `result`/`completed` timeline event.
fn result_payload(result: &ActionResult) -> Value {
    json!({
        "success": result.success,
        "cost": result.cost,
        "data": result.data,
        "error": result.error,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "tests use unwrap_used/expect_used on deterministic fixtures")]
    use serde_json::json;

    use super::Session;
    use crate::action::Action;
    use crate::action::ActionKind;
    use crate::action::ActionResult;
    use crate::action::ActionSpec;
    use crate::action::CostSpec;
    use crate::agent::Agent;
    use crate::params::GlobalParamOverrides;
    use crate::params::GlobalParams;
    use crate::scenario::Scenario;
    use crate::scenario::ScoringConfig;
    use crate::simulator::test_support::StubSimulator;
    use crate::timeline::EventKind;

    fn scenario_with(interface: indexmap::IndexMap<String, ActionSpec>, overrides: GlobalParamOverrides) -> Scenario {
        Scenario {
            name: "trial".to_owned(),
            briefing: "survive".to_owned(),
            constitution: String::new(),
            interface,
            params: GlobalParams::overlay(&overrides),
            scoring: ScoringConfig::default(),
        }
    }

    #[test]
    fn turn_based_single_action_matches_the_documented_trace() {
        let mut interface = indexmap::IndexMap::new();
        interface.insert(
            "add_feedstock".to_owned(),
            ActionSpec {
                name: "add_feedstock".to_owned(),
                kind: ActionKind::Action,
                duration: Some(0.5),
                cost: Some(CostSpec::Constant(1.0)),
                default_wait: None,
                schema: indexmap::IndexMap::new(),
            },
        );
        let overrides = GlobalParamOverrides {
            default_wait: Some(true),
            initiation_time: Some(0.1),
            ..GlobalParamOverrides::default()
        };
        let scenario = scenario_with(interface, overrides);
        let mut session = Session::new(scenario, StubSimulator::default(), 0);

        let result = session
            .act(Action {
                name: "add_feedstock".to_owned(),
                params: json!({}),
                kind: ActionKind::Action,
                wait: None,
            })
            .expect("act");
        assert!(result.success);
        assert_eq!(result.cost, 1.0);
        session.mark_agent_done();

        assert_eq!(session.spent, 1.0);
        assert_eq!(session.step_count, 1);
        assert!(session.is_done());
    }

    #[test]
    fn invalid_action_charges_error_cost_and_advances_initiation_time() {
        let scenario = scenario_with(indexmap::IndexMap::new(), GlobalParamOverrides::default());
        let mut session = Session::new(scenario, StubSimulator::default(), 0);

        let result = session
            .act(Action {
                name: "nope".to_owned(),
                params: json!({}),
                kind: ActionKind::Action,
                wait: None,
            })
            .expect("act");
        assert!(!result.success);
        assert_eq!(result.cost, 0.1);
        assert!(result.error.unwrap().contains("Unknown action"));
        assert_eq!(session.spent, 0.1);
    }

    #[test]
    fn measurement_cannot_be_deferred() {
        let mut interface = indexmap::IndexMap::new();
        interface.insert(
            "sample_ph".to_owned(),
            ActionSpec {
                name: "sample_ph".to_owned(),
                kind: ActionKind::Measurement,
                duration: Some(0.0),
                cost: Some(CostSpec::Constant(0.0)),
                default_wait: None,
                schema: indexmap::IndexMap::new(),
            },
        );
        let scenario = scenario_with(interface, GlobalParamOverrides::default());
        let mut session = Session::new(scenario, StubSimulator::default(), 0);

        let result = session
            .act(Action {
                name: "sample_ph".to_owned(),
                params: json!({}),
                kind: ActionKind::Measurement,
                wait: Some(false),
            })
            .expect("act");
        assert!(!result.success);
        assert!(result.error.unwrap().contains("cannot be deferred"));
        assert_eq!(session.spent, 0.1);
    }

    #[test]
    fn budget_termination_rejects_further_actions() {
        let mut interface = indexmap::IndexMap::new();
        interface.insert(
            "work".to_owned(),
            ActionSpec {
                name: "work".to_owned(),
                kind: ActionKind::Action,
                duration: Some(0.0),
                cost: Some(CostSpec::Constant(1.0)),
                default_wait: None,
                schema: indexmap::IndexMap::new(),
            },
        );
        let overrides = GlobalParamOverrides {
            budget: Some(1.5),
            initiation_time: Some(0.0),
            ..GlobalParamOverrides::default()
        };
        let scenario = scenario_with(interface, overrides);
        let mut session = Session::new(scenario, StubSimulator::default(), 0);

        for _ in 0..2 {
            session
                .act(Action {
                    name: "work".to_owned(),
                    params: json!({}),
                    kind: ActionKind::Action,
                    wait: None,
                })
                .expect("act");
        }
        assert_eq!(session.spent, 2.0);
        assert!(session.is_done());
        let err = session
            .act(Action {
                name: "work".to_owned(),
                params: json!({}),
                kind: ActionKind::Action,
                wait: None,
            })
            .unwrap_err();
        assert!(matches!(err, crate::error::SessionError::Terminated { .. }));
    }

    #[test]
    fn concurrent_actions_complete_in_scheduled_order() {
        let mut interface = indexmap::IndexMap::new();
        interface.insert(
            "slow".to_owned(),
            ActionSpec {
                name: "slow".to_owned(),
                kind: ActionKind::Action,
                duration: Some(2.0),
                cost: Some(CostSpec::Constant(1.0)),
                default_wait: None,
                schema: indexmap::IndexMap::new(),
            },
        );
        interface.insert(
            "fast".to_owned(),
            ActionSpec {
                name: "fast".to_owned(),
                kind: ActionKind::Action,
                duration: Some(0.5),
                cost: Some(CostSpec::Constant(1.0)),
                default_wait: None,
                schema: indexmap::IndexMap::new(),
            },
        );
        let overrides = GlobalParamOverrides {
            default_wait: Some(false),
            initiation_time: Some(0.1),
            ..GlobalParamOverrides::default()
        };
        let scenario = scenario_with(interface, overrides);
        let mut session = Session::new(scenario, StubSimulator::default(), 0);

        let slow = session
            .act(Action {
                name: "slow".to_owned(),
                params: json!({}),
                kind: ActionKind::Action,
                wait: None,
            })
            .expect("act");
        assert!(!slow.completed);

        let fast = session
            .act(Action {
                name: "fast".to_owned(),
                params: json!({}),
                kind: ActionKind::Action,
                wait: None,
            })
            .expect("act");
        assert!(!fast.completed);

        session.mark_agent_done();
        assert_eq!(session.spent, 0.0);
    }

    /// Submits a fixed script of concurrent actions, then ends voluntarily.
    struct ScriptedAgent {
        script: Vec<Action>,
        next: usize,
    }
    impl Agent for ScriptedAgent {
        fn start(&mut self, _briefing: &str, _initial_state: &serde_json::Value) {}
        fn decide(&mut self, _observable_state: &serde_json::Value) -> Option<Action> {
            let action = self.script.get(self.next).cloned();
            self.next += 1;
            action
        }
        fn observe_result(&mut self, _result: &ActionResult) {}
        fn end(&mut self, _final_state: &serde_json::Value, _score: Option<f64>) {}
    }

    #[test]
    fn premature_termination_flushes_pending_completions_before_scoring() {
        let mut interface = indexmap::IndexMap::new();
        interface.insert(
            "slow".to_owned(),
            ActionSpec {
                name: "slow".to_owned(),
                kind: ActionKind::Action,
                duration: Some(5.0),
                cost: Some(CostSpec::Constant(1.0)),
                default_wait: None,
                schema: indexmap::IndexMap::new(),
            },
        );
        let overrides = GlobalParamOverrides {
            default_wait: Some(false),
            initiation_time: Some(0.0),
            max_steps: Some(2),
            ..GlobalParamOverrides::default()
        };
        let scenario = scenario_with(interface, overrides);
        let mut session = Session::new(scenario, StubSimulator::default(), 0);
        let mut agent = ScriptedAgent {
            script: vec![
                Action {
                    name: "slow".to_owned(),
                    params: json!({}),
                    kind: ActionKind::Action,
                    wait: None,
                },
                Action {
                    name: "slow".to_owned(),
                    params: json!({}),
                    kind: ActionKind::Action,
                    wait: None,
                },
            ],
            next: 0,
        };

        let score = session.run_to_completion(&mut agent).expect("run");
        assert!(score.is_some());

        // `max_steps` terminates the session before either `slow` action's
        // 5.0-duration completion time is reached; both must still be
        // flushed to a paired `completed` event (spec.md §5, §8 Pairing)
        // rather than left dangling as `initiated`-only.
        let events = session.events_since(0);
        let initiated = events.iter().filter(|e| e.kind == EventKind::Initiated).count();
        let completed = events.iter().filter(|e| e.kind == EventKind::Completed).count();
        assert_eq!(initiated, 2);
        assert_eq!(completed, 2);
        assert_eq!(session.spent, 2.0);
    }
}
