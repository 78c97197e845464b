// src/dag/registry.rs

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::dag::task::Task;
use crate::errors::{Result, SchedError};
use crate::types::TaskId;

/// Static table of task definitions.
///
/// Filled once during start-up and then handed to the scheduler core, which
/// only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
        }
    }

    /// Build a registry from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut registry = Self::new();
        for tc in cfg.task.iter() {
            registry.register(Task::from_config(tc)?)?;
        }
        Ok(registry)
    }

    /// Add a task; fails if the id is already taken.
    pub fn register(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(SchedError::DuplicateTaskId(task.id));
        }
        debug!(task_id = task.id, task = %task.name, "registered task");
        self.tasks.insert(task.id, task);
        Ok(())
    }

    pub fn lookup(&self, id: TaskId) -> Result<&Task> {
        self.tasks
            .get(&id)
            .ok_or_else(|| SchedError::UnknownTaskId(id, "registry lookup".to_string()))
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Tasks ordered by id.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(|t| t.is_root)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Name for log output; falls back to the numeric id.
    pub fn name_of(&self, id: TaskId) -> String {
        self.tasks
            .get(&id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("task-{id}"))
    }
}
