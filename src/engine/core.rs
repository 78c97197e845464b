// src/engine/core.rs

//! Pure scheduler core.
//!
//! Owns the registry, the dependency graph state and the ready queue, and
//! makes every scheduling decision. It has no channels, no Tokio types and
//! performs no IO, so it can be driven step by step from tests with explicit
//! voltages and timestamps.

use std::cmp::Reverse;

use tracing::{debug, info, warn};

use crate::config::model::ConfigFile;
use crate::dag::{
    CompletionStep, DependencyGraph, ReadyQueue, Task, TaskInstance, TaskRegistry,
};
use crate::engine::{Outcome, SchedulerStats, Selection};
use crate::errors::{Result, SchedError};
use crate::types::{TaskId, TieBreak, Timestamp, Voltage};

#[derive(Debug)]
pub struct SchedulerCore {
    registry: TaskRegistry,
    graph: DependencyGraph,
    queue: ReadyQueue,
    tie_break: TieBreak,
    /// Instance handed to the executor and not yet completed.
    in_flight: Option<TaskInstance>,
    stats: SchedulerStats,
}

impl SchedulerCore {
    pub fn new(registry: TaskRegistry, tie_break: TieBreak) -> Self {
        Self {
            registry,
            graph: DependencyGraph::new(),
            queue: ReadyQueue::new(),
            tie_break,
            in_flight: None,
            stats: SchedulerStats::default(),
        }
    }

    /// Construct a core from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let registry = TaskRegistry::from_config(cfg)?;
        Ok(Self::new(registry, cfg.config.tie_break))
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Ready instances in enqueue order.
    pub fn ready(&self) -> Vec<TaskInstance> {
        self.queue.snapshot()
    }

    pub fn is_ready(&self, task_id: TaskId) -> bool {
        self.queue.contains(task_id)
    }

    pub fn in_flight(&self) -> Option<TaskInstance> {
        self.in_flight
    }

    pub fn next_timer_due(&self) -> Option<Timestamp> {
        self.graph.next_timer_due()
    }

    /// Nothing ready, nothing running, no rearm pending.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_none() && !self.graph.has_pending_timers()
    }

    /// Make every root task ready.
    pub fn bootstrap(&mut self, now: Timestamp) -> CompletionStep {
        self.graph.bootstrap(&self.registry, &mut self.queue, now)
    }

    pub fn trigger(&mut self, task_id: TaskId, now: Timestamp) -> Result<CompletionStep> {
        self.graph
            .trigger(&self.registry, &mut self.queue, task_id, now)
    }

    pub fn poll_timers(&mut self, now: Timestamp) -> CompletionStep {
        let step = self.graph.poll_timers(&mut self.queue, now);
        if !step.enqueued.is_empty() {
            debug!(enqueued = ?step.enqueued, now, "rearm timers made tasks ready");
        }
        step
    }

    /// Select phase: pick the highest-priority ready task whose threshold is
    /// covered by `voltage`. Does not modify the queue.
    pub fn select(&self, voltage: Voltage) -> Result<Selection> {
        let ready = self.queue.snapshot();
        if ready.is_empty() {
            return Ok(Selection::Idle);
        }

        let mut best: Option<(&TaskInstance, &Task)> = None;

        for instance in ready.iter() {
            let task = self.registry.lookup(instance.task_id)?;
            if !task.is_feasible_at(voltage) {
                continue;
            }
            best = match best {
                Some((cur_inst, cur_task))
                    if self.rank(cur_inst, cur_task) >= self.rank(instance, task) =>
                {
                    Some((cur_inst, cur_task))
                }
                _ => Some((instance, task)),
            };
        }

        match best {
            Some((_, task)) => Ok(Selection::Dispatch {
                task_id: task.id,
                priority: task.priority,
                required_voltage: task.required_voltage,
            }),
            None => Ok(Selection::Stall {
                voltage,
                pending: ready.iter().map(|i| i.task_id).collect(),
            }),
        }
    }

    /// Dispatch phase: remove the instance for `task_id` from the queue and
    /// mark it in flight.
    ///
    /// Refuses to start anything whose threshold exceeds `voltage` or while
    /// another instance is still running.
    pub fn dispatch(
        &mut self,
        task_id: TaskId,
        voltage: Voltage,
        now: Timestamp,
    ) -> Result<TaskInstance> {
        if let Some(running) = self.in_flight {
            return Err(SchedError::Other(anyhow::anyhow!(
                "cannot dispatch task {task_id}: task {} is still running",
                running.task_id
            )));
        }

        let task = self.registry.lookup(task_id)?;
        if !task.is_feasible_at(voltage) {
            return Err(SchedError::Other(anyhow::anyhow!(
                "refusing to dispatch task {task_id} ('{}'): requires {} but supply is {voltage}",
                task.name,
                task.required_voltage
            )));
        }

        let mut instance = self.queue.remove(task_id).ok_or_else(|| {
            SchedError::Other(anyhow::anyhow!("task {task_id} has no ready instance"))
        })?;
        instance.start_time = Some(now);

        info!(
            task_id,
            task = %task.name,
            priority = task.priority,
            required_voltage = task.required_voltage,
            voltage,
            waited = now.saturating_sub(instance.enqueue_time),
            "dispatching task"
        );

        self.in_flight = Some(instance);
        self.stats.dispatched += 1;
        Ok(instance)
    }

    /// Completion handler: clear the in-flight instance and advance the
    /// dependency graph.
    pub fn complete(
        &mut self,
        task_id: TaskId,
        outcome: Outcome,
        now: Timestamp,
    ) -> Result<CompletionStep> {
        match self.in_flight {
            Some(running) if running.task_id == task_id => {
                self.in_flight = None;
            }
            Some(running) => {
                return Err(SchedError::Other(anyhow::anyhow!(
                    "completion for task {task_id} while task {} is in flight",
                    running.task_id
                )));
            }
            None => {
                return Err(SchedError::Other(anyhow::anyhow!(
                    "completion for task {task_id} which was never dispatched"
                )));
            }
        }

        self.stats.completed += 1;
        if !outcome.success {
            self.stats.failed += 1;
            warn!(
                task_id,
                task = %self.registry.name_of(task_id),
                "task execution failed"
            );
        }

        let step = self.graph.on_task_complete(
            &self.registry,
            &mut self.queue,
            task_id,
            &outcome,
            now,
        )?;

        debug!(
            task_id,
            success = outcome.success,
            measured = ?outcome.measured_value,
            enqueued = ?step.enqueued,
            deferred = ?step.deferred,
            "completion processed"
        );

        Ok(step)
    }

    pub fn record_stall(&mut self) {
        self.stats.stalls += 1;
    }

    /// Ordering key: higher priority first, then the configured tie-break.
    fn rank(&self, instance: &TaskInstance, task: &Task) -> (u32, Reverse<u64>) {
        let tie = match self.tie_break {
            TieBreak::Fifo => instance.seq,
            TieBreak::TaskId => u64::from(task.id),
        };
        (task.priority, Reverse(tie))
    }
}
