use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voltsched::dag::{Task, TaskInstance};
use voltsched::engine::Outcome;
use voltsched::errors::Result;
use voltsched::exec::TaskExecutor;
use voltsched::sensor::{Clock, TokioClock};
use voltsched::types::{TaskId, Timestamp};

/// One recorded dispatch: which task, and when (ms on the Tokio clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub task_id: TaskId,
    pub at: Timestamp,
}

type RunHook = Box<dyn FnMut(TaskId) + Send>;

/// A fake executor that:
/// - records which tasks were "run" and when
/// - optionally sleeps for the task's `execution_time` (use with paused time)
/// - returns scripted outcomes per task, defaulting to success.
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<Dispatched>>>,
    outcomes: HashMap<TaskId, VecDeque<Outcome>>,
    sleep_execution_time: bool,
    clock: TokioClock,
    on_run: Option<RunHook>,
}

impl FakeExecutor {
    pub fn new(executed: Arc<Mutex<Vec<Dispatched>>>) -> Self {
        Self {
            executed,
            outcomes: HashMap::new(),
            sleep_execution_time: false,
            clock: TokioClock::new(),
            on_run: None,
        }
    }

    /// Sleep `execution_time` ms per run so time-based edges see real durations.
    pub fn sleeping(mut self) -> Self {
        self.sleep_execution_time = true;
        self
    }

    /// Queue outcomes for `task`; once exhausted, runs succeed.
    pub fn with_outcomes(mut self, task: TaskId, outcomes: &[Outcome]) -> Self {
        self.outcomes
            .entry(task)
            .or_default()
            .extend(outcomes.iter().copied());
        self
    }

    /// Called after each run, e.g. to drain a `SharedVoltage`.
    pub fn on_run(mut self, hook: impl FnMut(TaskId) + Send + 'static) -> Self {
        self.on_run = Some(Box::new(hook));
        self
    }
}

impl TaskExecutor for FakeExecutor {
    fn execute<'a>(
        &'a mut self,
        task: &'a Task,
        _instance: TaskInstance,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>> {
        let executed = Arc::clone(&self.executed);
        let at = self.clock.now();
        let outcome = self
            .outcomes
            .get_mut(&task.id)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(Outcome::success);
        let sleep = self.sleep_execution_time;

        Box::pin(async move {
            {
                let mut guard = executed.lock().unwrap();
                guard.push(Dispatched {
                    task_id: task.id,
                    at,
                });
            }

            if sleep {
                tokio::time::sleep(Duration::from_millis(task.execution_time)).await;
            }

            if let Some(hook) = self.on_run.as_mut() {
                hook(task.id);
            }

            Ok(outcome)
        })
    }
}
