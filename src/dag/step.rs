// src/dag/step.rs

//! Result type for a single dependency-graph step.

use crate::types::{TaskId, Timestamp};

/// What a completion (or timer poll) changed.
///
/// Useful for tests that drive the graph by hand and want to assert on the
/// exact effect of one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionStep {
    /// Tasks that got a new ready instance.
    pub enqueued: Vec<TaskId>,
    /// Tasks whose edge held but which were already ready.
    pub deduplicated: Vec<TaskId>,
    /// Timed rearm targets scheduled for later, with their due time.
    pub deferred: Vec<(TaskId, Timestamp)>,
    /// True if the completed task failed and its edges were skipped.
    pub suppressed: bool,
}

impl CompletionStep {
    pub fn is_empty(&self) -> bool {
        self.enqueued.is_empty() && self.deduplicated.is_empty() && self.deferred.is_empty()
    }
}
