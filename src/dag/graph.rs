// src/dag/graph.rs

//! Dependency graph engine: turns completions and external signals into
//! ready instances according to each edge's readiness condition.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::dag::ready_queue::ReadyQueue;
use crate::dag::registry::TaskRegistry;
use crate::dag::step::CompletionStep;
use crate::dag::task::EdgeKind;
use crate::engine::Outcome;
use crate::errors::Result;
use crate::types::{FailurePolicy, MeasuredValue, TaskId, Timestamp};

/// Identity of an edge: its parent task plus its position in `Task::edges`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub parent: TaskId,
    pub index: usize,
}

impl EdgeKey {
    pub fn new(parent: TaskId, index: usize) -> Self {
        Self { parent, index }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    target: TaskId,
    due: Timestamp,
}

/// Which outgoing edges a completion is allowed to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeFilter {
    All,
    TimedRearmOnly,
}

/// Mutable readiness state, keyed by edge. The task table itself stays in the
/// [`TaskRegistry`] and is never written to.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// `Availability` edges: producer completions since the last firing.
    availability: HashMap<EdgeKey, u32>,
    /// `TimedRearm` edges: when the edge last fired.
    last_fire: HashMap<EdgeKey, Timestamp>,
    /// `TimedRearm` edges waiting for their due time.
    timers: BTreeMap<EdgeKey, PendingTimer>,
    /// `ThresholdCompare` edges: last value reported by the parent.
    last_measured: HashMap<EdgeKey, MeasuredValue>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue the initial instance of every root task.
    pub fn bootstrap(
        &mut self,
        registry: &TaskRegistry,
        queue: &mut ReadyQueue,
        now: Timestamp,
    ) -> CompletionStep {
        let mut step = CompletionStep::default();
        for task in registry.roots() {
            info!(task_id = task.id, task = %task.name, "bootstrapping root task");
            Self::fire(queue, task.id, now, &mut step);
        }
        step
    }

    /// External signal: make `task_id` ready now.
    pub fn trigger(
        &mut self,
        registry: &TaskRegistry,
        queue: &mut ReadyQueue,
        task_id: TaskId,
        now: Timestamp,
    ) -> Result<CompletionStep> {
        let task = registry.lookup(task_id)?;
        debug!(task_id, task = %task.name, "external trigger");
        let mut step = CompletionStep::default();
        Self::fire(queue, task_id, now, &mut step);
        Ok(step)
    }

    /// Evaluate every outgoing edge of a completed task.
    pub fn on_task_complete(
        &mut self,
        registry: &TaskRegistry,
        queue: &mut ReadyQueue,
        task_id: TaskId,
        outcome: &Outcome,
        now: Timestamp,
    ) -> Result<CompletionStep> {
        let task = registry.lookup(task_id)?;
        let mut step = CompletionStep::default();

        let filter = if outcome.success {
            EdgeFilter::All
        } else {
            match task.on_failure {
                FailurePolicy::Suppress => {
                    warn!(
                        task_id,
                        task = %task.name,
                        "task failed; suppressing all outgoing edges"
                    );
                    step.suppressed = true;
                    return Ok(step);
                }
                FailurePolicy::Rearm => {
                    warn!(
                        task_id,
                        task = %task.name,
                        "task failed; only timed rearm edges evaluated"
                    );
                    step.suppressed = true;
                    EdgeFilter::TimedRearmOnly
                }
                FailurePolicy::Propagate => {
                    warn!(
                        task_id,
                        task = %task.name,
                        "task failed; propagating to children per policy"
                    );
                    EdgeFilter::All
                }
            }
        };

        if task.is_terminal() {
            debug!(task_id, task = %task.name, "terminal task; nothing to enqueue");
        }

        for (index, edge) in task.edges.iter().enumerate() {
            if filter == EdgeFilter::TimedRearmOnly && !edge.kind.is_timed_rearm() {
                continue;
            }

            let key = EdgeKey::new(task_id, index);

            match edge.kind {
                EdgeKind::Unconditional => {
                    Self::fire(queue, edge.target, now, &mut step);
                }
                EdgeKind::TimedRearm { period } => {
                    self.arm_timer(queue, key, edge.target, period, now, &mut step);
                }
                EdgeKind::Availability { required } => {
                    let count = self.availability.entry(key).or_insert(0);
                    *count += 1;
                    if *count >= required {
                        *count = 0;
                        Self::fire(queue, edge.target, now, &mut step);
                    } else {
                        debug!(
                            parent = task_id,
                            target = edge.target,
                            count = *count,
                            required,
                            "availability not yet reached"
                        );
                    }
                }
                EdgeKind::ThresholdCompare { bound, comparator } => {
                    match outcome.measured_value {
                        Some(value) => {
                            self.last_measured.insert(key, value);
                            if comparator.holds(value, bound) {
                                Self::fire(queue, edge.target, now, &mut step);
                            } else {
                                debug!(
                                    parent = task_id,
                                    target = edge.target,
                                    value,
                                    bound,
                                    op = comparator.symbol(),
                                    "threshold not met"
                                );
                            }
                        }
                        None => {
                            warn!(
                                parent = task_id,
                                target = edge.target,
                                "threshold edge needs a measured value but none was reported"
                            );
                        }
                    }
                }
            }
        }

        Ok(step)
    }

    /// Fire every timed rearm whose due time has passed.
    pub fn poll_timers(&mut self, queue: &mut ReadyQueue, now: Timestamp) -> CompletionStep {
        let mut step = CompletionStep::default();

        let mut due: Vec<(Timestamp, EdgeKey, TaskId)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= now)
            .map(|(key, t)| (t.due, *key, t.target))
            .collect();
        due.sort();

        for (due_at, key, target) in due {
            self.timers.remove(&key);
            self.last_fire.insert(key, now);
            debug!(
                parent = key.parent,
                target,
                due = due_at,
                now,
                "timed rearm fired"
            );
            Self::fire(queue, target, now, &mut step);
        }

        step
    }

    /// Earliest due time among pending rearm timers.
    pub fn next_timer_due(&self) -> Option<Timestamp> {
        self.timers.values().map(|t| t.due).min()
    }

    pub fn has_pending_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn availability_count(&self, key: EdgeKey) -> u32 {
        self.availability.get(&key).copied().unwrap_or(0)
    }

    pub fn last_fire(&self, key: EdgeKey) -> Option<Timestamp> {
        self.last_fire.get(&key).copied()
    }

    pub fn last_measured(&self, key: EdgeKey) -> Option<MeasuredValue> {
        self.last_measured.get(&key).copied()
    }

    fn arm_timer(
        &mut self,
        queue: &mut ReadyQueue,
        key: EdgeKey,
        target: TaskId,
        period: Timestamp,
        now: Timestamp,
        step: &mut CompletionStep,
    ) {
        if let Some(pending) = self.timers.get(&key) {
            debug!(
                parent = key.parent,
                target,
                due = pending.due,
                "timed rearm already pending"
            );
            return;
        }

        let due = match self.last_fire.get(&key) {
            Some(last) => last.saturating_add(period),
            None => now.saturating_add(period),
        };

        if due <= now {
            self.last_fire.insert(key, now);
            Self::fire(queue, target, now, step);
        } else {
            debug!(parent = key.parent, target, due, "timed rearm deferred");
            self.timers.insert(key, PendingTimer { target, due });
            step.deferred.push((target, due));
        }
    }

    fn fire(queue: &mut ReadyQueue, target: TaskId, now: Timestamp, step: &mut CompletionStep) {
        if queue.enqueue(target, now) {
            debug!(task_id = target, now, "enqueued ready instance");
            step.enqueued.push(target);
        } else {
            step.deduplicated.push(target);
        }
    }
}
