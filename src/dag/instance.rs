// src/dag/instance.rs

use crate::types::{TaskId, Timestamp};

/// One runtime occurrence of a task becoming eligible to run.
///
/// Created by the dependency graph (or at bootstrap for roots), held by the
/// [`ReadyQueue`](crate::dag::ReadyQueue) and consumed exactly once by dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskInstance {
    pub task_id: TaskId,
    pub enqueue_time: Timestamp,
    /// Set when the instance is handed to the executor.
    pub start_time: Option<Timestamp>,
    /// Global enqueue order; lower means earlier.
    pub seq: u64,
}

impl TaskInstance {
    pub fn new(task_id: TaskId, enqueue_time: Timestamp, seq: u64) -> Self {
        Self {
            task_id,
            enqueue_time,
            start_time: None,
            seq,
        }
    }
}
