// src/dag/ready_queue.rs

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::dag::instance::TaskInstance;
use crate::types::{TaskId, Timestamp};

/// Ready instances awaiting dispatch, at most one per task id.
///
/// `by_task` enforces de-duplication; `order` keeps insertion order so that
/// snapshots (and FIFO tie-breaks) are deterministic.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    by_task: HashMap<TaskId, TaskInstance>,
    order: BTreeMap<u64, TaskId>,
    next_seq: u64,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a fresh instance for `task_id`.
    ///
    /// Returns `false` (and changes nothing) if the task is already pending.
    pub fn enqueue(&mut self, task_id: TaskId, now: Timestamp) -> bool {
        if self.by_task.contains_key(&task_id) {
            debug!(task_id, "already ready; enqueue skipped");
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        self.by_task
            .insert(task_id, TaskInstance::new(task_id, now, seq));
        self.order.insert(seq, task_id);
        true
    }

    /// Pending instances in enqueue order.
    pub fn snapshot(&self) -> Vec<TaskInstance> {
        self.order
            .values()
            .filter_map(|id| self.by_task.get(id).copied())
            .collect()
    }

    pub fn remove(&mut self, task_id: TaskId) -> Option<TaskInstance> {
        let instance = self.by_task.remove(&task_id)?;
        self.order.remove(&instance.seq);
        Some(instance)
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.by_task.contains_key(&task_id)
    }

    pub fn len(&self) -> usize {
        self.by_task.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_task.is_empty()
    }
}
