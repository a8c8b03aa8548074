// crates/xenospec-session/src/timeline.rs
// ============================================================================
// Module: XenoSpec Timeline
// Description: The append-only event log that is simultaneously history,
// polling surface, and cost ledger.
// Purpose: Implements spec.md §4.8's Timeline and the scheduled-completion
// priority queue spec.md §5 assigns to "the simulator's scheduler" but which,
// per this crate's own architecture, the session/timeline drains.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`Timeline`] is an append-only `Vec<Event>` plus a min-heap of pending
//! scheduled completions, keyed by completion time with FIFO tie-breaking
//! on initiation order (spec.md §4.8.2 step 8, §5). Every event the session
//! appends is monotonic non-decreasing in `time` (spec.md's Timeline
//! monotonicity property); the heap is what lets a `completed` event be
//! inserted "retroactively" in time order even though it is appended after
//! whatever action happens to trigger its drain.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde_json::Value;

/// What kind of moment an [`Event`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// An agent submitted an action or measurement.
    Action,
    /// A turn-based action's synchronous outcome.
    Result,
    /// A concurrent action has begun and is now pending.
    Initiated,
    /// A previously `initiated` action has finished.
    Completed,
    /// An out-of-band notification not tied to a specific action.
    Notification,
}

/// One entry in the [`Timeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The simulation time this event occurred at.
    pub time: f64,
    /// What kind of event this is.
    pub kind: EventKind,
    /// The event's payload: shape depends on `kind` (e.g. `{name, params,
    /// wait}` for `Action`, `{success, cost, data, error}` for `Result`/
    /// `Completed`).
    pub payload: Value,
}

/// A pending concurrent action awaiting its scheduled completion.
#[derive(Debug, Clone)]
struct PendingCompletion {
    completion_time: f64,
    initiation_order: u64,
    name: String,
    params: Value,
    kind: crate::action::ActionKind,
}

impl PartialEq for PendingCompletion {
    fn eq(&self, other: &Self) -> bool {
        self.completion_time == other.completion_time && self.initiation_order == other.initiation_order
    }
}
impl Eq for PendingCompletion {}

impl PartialOrd for PendingCompletion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingCompletion {
    /// Reversed so [`BinaryHeap`] (a max-heap) pops the *earliest*
    /// completion time first, FIFO on initiation order for ties.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .completion_time
            .partial_cmp(&self.completion_time)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.initiation_order.cmp(&self.initiation_order))
    }
}

/// The session's append-only event log and scheduled-completion queue.
///
/// # Invariants
/// - `events` is monotonic non-decreasing in `time`.
/// - A [`PendingCompletion`] is only ever removed by [`Timeline::drain_ready`],
///   in completion-time order with FIFO tie-breaking on initiation order.
#[derive(Debug, Default)]
pub struct Timeline {
    events: Vec<Event>,
    pending: BinaryHeap<PendingCompletion>,
    next_initiation_order: u64,
}

impl Timeline {
    /// Builds an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Timeline::default()
    }

    /// Appends `event` to the log.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// All events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events recorded at or after index `since`, for the polling primitive
    /// spec.md §4.8.1 requires so an agent can discover completions in
    /// concurrent mode.
    #[must_use]
    pub fn events_since(&self, since: usize) -> &[Event] {
        if since >= self.events.len() {
            &[]
        } else {
            &self.events[since..]
        }
    }

    /// The sum of `cost` fields across every `result`/`completed` event
    /// recorded so far (spec.md's cost-ledger property).
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Result | EventKind::Completed))
            .map(|e| e.payload.get("cost").and_then(Value::as_f64).unwrap_or(0.0))
            .sum()
    }

    /// Registers a newly initiated concurrent action, to be drained by a
    /// later [`Timeline::drain_ready`] once `completion_time` arrives.
    pub fn schedule_completion(
        &mut self,
        name: String,
        params: Value,
        kind: crate::action::ActionKind,
        completion_time: f64,
    ) {
        let initiation_order = self.next_initiation_order;
        self.next_initiation_order += 1;
        self.pending.push(PendingCompletion {
            completion_time,
            initiation_order,
            name,
            params,
            kind,
        });
    }

    /// Pops every pending completion whose `completion_time <= now`, in
    /// completion-time order (FIFO on initiation order for ties), handing
    /// each to `on_ready` for the caller to execute and append its
    /// `completed` event.
    pub fn drain_ready(
        &mut self,
        now: f64,
        mut on_ready: impl FnMut(&str, &Value, crate::action::ActionKind, f64),
    ) {
        loop {
            let due_now = self.pending.peek().is_some_and(|top| top.completion_time <= now);
            if !due_now {
                break;
            }
            let Some(due) = self.pending.pop() else {
                break;
            };
            on_ready(&due.name, &due.params, due.kind, due.completion_time);
        }
    }

    /// Whether any concurrent action is still pending.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The completion time of the earliest still-pending action, if any.
    ///
    /// Used to fast-forward past due-but-not-yet-reached completions when a
    /// session terminates prematurely (spec.md §5: "premature termination
    /// drains pending completions and then stops").
    #[must_use]
    pub fn next_completion_time(&self) -> Option<f64> {
        self.pending.peek().map(|top| top.completion_time)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Event;
    use super::EventKind;
    use super::Timeline;
    use crate::action::ActionKind;

    #[test]
    fn total_cost_sums_only_result_and_completed_events() {
        let mut timeline = Timeline::new();
        timeline.push(Event {
            time: 0.0,
            kind: EventKind::Action,
            payload: json!({ "name": "x" }),
        });
        timeline.push(Event {
            time: 0.5,
            kind: EventKind::Result,
            payload: json!({ "cost": 1.0 }),
        });
        timeline.push(Event {
            time: 1.0,
            kind: EventKind::Completed,
            payload: json!({ "cost": 2.0 }),
        });
        assert_eq!(timeline.total_cost(), 3.0);
    }

    #[test]
    fn drain_ready_fires_in_completion_time_order_with_fifo_ties() {
        let mut timeline = Timeline::new();
        timeline.schedule_completion("slow".to_owned(), json!({}), ActionKind::Action, 2.1);
        timeline.schedule_completion("fast".to_owned(), json!({}), ActionKind::Action, 0.7);
        timeline.schedule_completion("tie_a".to_owned(), json!({}), ActionKind::Action, 0.7);

        let mut fired = Vec::new();
        timeline.drain_ready(3.0, |name, _, _, _| fired.push(name.to_owned()));
        assert_eq!(fired, vec!["fast", "tie_a", "slow"]);
        assert!(!timeline.has_pending());
    }

    #[test]
    fn drain_ready_only_pops_what_is_due() {
        let mut timeline = Timeline::new();
        timeline.schedule_completion("later".to_owned(), json!({}), ActionKind::Action, 5.0);
        let mut fired = Vec::new();
        timeline.drain_ready(1.0, |name, _, _, _| fired.push(name.to_owned()));
        assert!(fired.is_empty());
        assert!(timeline.has_pending());
    }

    #[test]
    fn events_since_returns_the_suffix() {
        let mut timeline = Timeline::new();
        for i in 0..3 {
            timeline.push(Event {
                time: f64::from(i),
                kind: EventKind::Notification,
                payload: json!(i),
            });
        }
        assert_eq!(timeline.events_since(1).len(), 2);
        assert!(timeline.events_since(10).is_empty());
    }
}
