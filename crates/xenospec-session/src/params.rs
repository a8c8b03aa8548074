// crates/xenospec-session/src/params.rs
// ============================================================================
// Module: XenoSpec Global Parameters
// Description: The three-level (builtin < scenario < per-action) parameter
// table governing timing, cost, and limits.
// Purpose: Implements spec.md §6's global parameter table and the layered
// precedence spec.md §4.8 describes for `wait`/`duration`/`cost`.
// Dependencies: none (stdlib only)
// ============================================================================

//! ## Overview
//! [`GlobalParams`] holds the builtin defaults from spec.md §6, overlaid by
//! whatever a scenario's body sets under `action.timing`/`action.cost`/
//! `action.limits`. Per-action overrides (an individual action spec's own
//! `duration`/`cost`/`wait` fields) are resolved directly against an
//! [`crate::ActionSpec`] at call time rather than folded into this struct —
//! there is no bound list of action names to pre-merge against.

/// Timing, cost, and limit defaults, builtin values overlaid by whatever a
/// scenario declares.
///
/// # Invariants
/// - Every field always has a value; "null" defaults (e.g. no budget
///   ceiling) are represented as `Option::None`, never as a sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalParams {
    /// `action.timing.default_wait`.
    pub default_wait: bool,
    /// `action.timing.initiation_time`.
    pub initiation_time: f64,
    /// `action.timing.default_duration`.
    pub default_duration: f64,
    /// `action.timing.steps_per_action` (not in the §6 table but used by
    /// the turn-based advance-on-completion step; default 0).
    pub steps_per_action: f64,
    /// `action.cost.default_action`.
    pub default_action_cost: f64,
    /// `action.cost.default_measurement`.
    pub default_measurement_cost: f64,
    /// `action.cost.error`.
    pub error_cost: f64,
    /// `action.limits.max_steps`.
    pub max_steps: u64,
    /// `action.limits.max_sim_time`.
    pub max_sim_time: Option<f64>,
    /// `action.limits.budget`.
    pub budget: Option<f64>,
    /// `action.limits.wall_clock_timeout`, in seconds.
    pub wall_clock_timeout: f64,
    /// `action.limits.termination`, an unparsed scoring-language expression.
    pub termination: Option<String>,
}

impl Default for GlobalParams {
    /// The builtin defaults from spec.md §6.
    fn default() -> Self {
        GlobalParams {
            default_wait: true,
            initiation_time: 0.1,
            default_duration: 0.1,
            steps_per_action: 0.0,
            default_action_cost: 1.0,
            default_measurement_cost: 0.0,
            error_cost: 0.1,
            max_steps: 100,
            max_sim_time: None,
            budget: None,
            wall_clock_timeout: 300.0,
            termination: None,
        }
    }
}

impl GlobalParams {
    /// Overlays `overrides` (read from a scenario body's `action.*`
    /// sections) on top of the builtin defaults, returning the merged
    /// table. Fields `overrides` leaves as `None` keep their builtin value.
    #[must_use]
    pub fn overlay(overrides: &GlobalParamOverrides) -> Self {
        let mut params = GlobalParams::default();
        if let Some(v) = overrides.default_wait {
            params.default_wait = v;
        }
        if let Some(v) = overrides.initiation_time {
            params.initiation_time = v;
        }
        if let Some(v) = overrides.default_duration {
            params.default_duration = v;
        }
        if let Some(v) = overrides.steps_per_action {
            params.steps_per_action = v;
        }
        if let Some(v) = overrides.default_action_cost {
            params.default_action_cost = v;
        }
        if let Some(v) = overrides.default_measurement_cost {
            params.default_measurement_cost = v;
        }
        if let Some(v) = overrides.error_cost {
            params.error_cost = v;
        }
        if let Some(v) = overrides.max_steps {
            params.max_steps = v;
        }
        if overrides.max_sim_time.is_some() {
            params.max_sim_time = overrides.max_sim_time;
        }
        if overrides.budget.is_some() {
            params.budget = overrides.budget;
        }
        if let Some(v) = overrides.wall_clock_timeout {
            params.wall_clock_timeout = v;
        }
        if overrides.termination.is_some() {
            params.termination.clone_from(&overrides.termination);
        }
        params
    }
}

/// The subset of [`GlobalParams`] a scenario body may override. Every field
/// is optional; absence means "keep the builtin default".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalParamOverrides {
    /// See [`GlobalParams::default_wait`].
    pub default_wait: Option<bool>,
    /// See [`GlobalParams::initiation_time`].
    pub initiation_time: Option<f64>,
    /// See [`GlobalParams::default_duration`].
    pub default_duration: Option<f64>,
    /// See [`GlobalParams::steps_per_action`].
    pub steps_per_action: Option<f64>,
    /// See [`GlobalParams::default_action_cost`].
    pub default_action_cost: Option<f64>,
    /// See [`GlobalParams::default_measurement_cost`].
    pub default_measurement_cost: Option<f64>,
    /// See [`GlobalParams::error_cost`].
    pub error_cost: Option<f64>,
    /// See [`GlobalParams::max_steps`].
    pub max_steps: Option<u64>,
    /// See [`GlobalParams::max_sim_time`].
    pub max_sim_time: Option<f64>,
    /// See [`GlobalParams::budget`].
    pub budget: Option<f64>,
    /// See [`GlobalParams::wall_clock_timeout`].
    pub wall_clock_timeout: Option<f64>,
    /// See [`GlobalParams::termination`].
    pub termination: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::GlobalParamOverrides;
    use super::GlobalParams;

    #[test]
    fn builtin_defaults_match_the_external_interface_table() {
        let params = GlobalParams::default();
        assert!(params.default_wait);
        assert_eq!(params.initiation_time, 0.1);
        assert_eq!(params.default_duration, 0.1);
        assert_eq!(params.default_action_cost, 1.0);
        assert_eq!(params.default_measurement_cost, 0.0);
        assert_eq!(params.error_cost, 0.1);
        assert_eq!(params.max_steps, 100);
        assert_eq!(params.max_sim_time, None);
        assert_eq!(params.budget, None);
        assert_eq!(params.wall_clock_timeout, 300.0);
        assert_eq!(params.termination, None);
    }

    #[test]
    fn overlay_replaces_only_the_overridden_fields() {
        let overrides = GlobalParamOverrides {
            budget: Some(1.5),
            default_wait: Some(false),
            ..GlobalParamOverrides::default()
        };
        let params = GlobalParams::overlay(&overrides);
        assert_eq!(params.budget, Some(1.5));
        assert!(!params.default_wait);
        assert_eq!(params.initiation_time, 0.1);
    }
}
