// src/exec/simulated.rs

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::dag::{Task, TaskInstance};
use crate::engine::Outcome;
use crate::errors::Result;
use crate::types::{MeasuredValue, TaskId};

use super::backend::TaskExecutor;

/// Scripted behaviour of one simulated body.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBody {
    /// Cycled through, one value per run.
    pub measurements: Vec<MeasuredValue>,
    /// Fail every n-th run (1-based); 0 means never.
    pub fail_every: u32,
}

/// Stand-in for real task bodies: takes `execution_time` ms and reports the
/// scripted measurement.
#[derive(Debug, Default)]
pub struct SimulatedExecutor {
    bodies: HashMap<TaskId, SimulatedBody>,
    runs: HashMap<TaskId, u64>,
    /// Sleep for `execution_time`; when false bodies return immediately.
    realtime: bool,
}

impl SimulatedExecutor {
    pub fn new(realtime: bool) -> Self {
        Self {
            bodies: HashMap::new(),
            runs: HashMap::new(),
            realtime,
        }
    }

    pub fn from_config(cfg: &ConfigFile, realtime: bool) -> Self {
        let mut exec = Self::new(realtime);
        for tc in cfg.task.iter() {
            exec.set_body(
                tc.id,
                SimulatedBody {
                    measurements: tc.measurements.clone(),
                    fail_every: tc.fail_every.unwrap_or(0),
                },
            );
        }
        exec
    }

    pub fn set_body(&mut self, task: TaskId, body: SimulatedBody) {
        self.bodies.insert(task, body);
    }

    /// How many times `task` has been run.
    pub fn runs_of(&self, task: TaskId) -> u64 {
        self.runs.get(&task).copied().unwrap_or(0)
    }

    fn next_outcome(&mut self, task: TaskId) -> Outcome {
        let run = {
            let counter = self.runs.entry(task).or_insert(0);
            *counter += 1;
            *counter
        };

        let Some(body) = self.bodies.get(&task) else {
            return Outcome::success();
        };

        if body.fail_every > 0 && run % u64::from(body.fail_every) == 0 {
            return Outcome::failed();
        }

        let measured_value = if body.measurements.is_empty() {
            None
        } else {
            let index = ((run - 1) % body.measurements.len() as u64) as usize;
            Some(body.measurements[index])
        };

        Outcome {
            success: true,
            measured_value,
        }
    }
}

impl TaskExecutor for SimulatedExecutor {
    fn execute<'a>(
        &'a mut self,
        task: &'a Task,
        instance: TaskInstance,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>> {
        let outcome = self.next_outcome(task.id);
        let duration = Duration::from_millis(task.execution_time);
        let realtime = self.realtime;

        Box::pin(async move {
            if realtime {
                tokio::time::sleep(duration).await;
            }
            debug!(
                task_id = task.id,
                task = %task.name,
                enqueued_at = instance.enqueue_time,
                success = outcome.success,
                measured = ?outcome.measured_value,
                "simulated body finished"
            );
            Ok(outcome)
        })
    }
}
