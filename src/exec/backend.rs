// src/exec/backend.rs

//! Pluggable task executor abstraction.
//!
//! The runtime talks to a `TaskExecutor` instead of to concrete task bodies.
//! Production wiring uses [`ConfiguredExecutor`], which routes each task to a
//! shell command when one is configured and to the simulator otherwise. Tests
//! provide their own executor that records dispatches and returns scripted
//! outcomes.

use std::future::Future;
use std::pin::Pin;

use crate::config::model::ConfigFile;
use crate::dag::{Task, TaskInstance};
use crate::engine::Outcome;
use crate::errors::Result;

use super::simulated::SimulatedExecutor;
use super::task_runner::CommandExecutor;

/// Runs one task body to completion.
///
/// The call is run-to-completion from the scheduler's point of view: the
/// runtime awaits it before doing anything else. Body failures are reported
/// as `Outcome { success: false, .. }`; an `Err` means the executor itself
/// broke and is treated the same way by the runtime.
pub trait TaskExecutor: Send {
    fn execute<'a>(
        &'a mut self,
        task: &'a Task,
        instance: TaskInstance,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>>;
}

impl<E: TaskExecutor + ?Sized> TaskExecutor for Box<E> {
    fn execute<'a>(
        &'a mut self,
        task: &'a Task,
        instance: TaskInstance,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>> {
        (**self).execute(task, instance)
    }
}

/// Executor used by the binary: command bodies where configured, simulated
/// bodies for everything else.
pub struct ConfiguredExecutor {
    commands: CommandExecutor,
    simulated: SimulatedExecutor,
}

impl ConfiguredExecutor {
    pub fn from_config(cfg: &ConfigFile, realtime: bool) -> Result<Self> {
        Ok(Self {
            commands: CommandExecutor::from_config(cfg)?,
            simulated: SimulatedExecutor::from_config(cfg, realtime),
        })
    }
}

impl TaskExecutor for ConfiguredExecutor {
    fn execute<'a>(
        &'a mut self,
        task: &'a Task,
        instance: TaskInstance,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>> {
        if self.commands.has_body(task.id) {
            self.commands.execute(task, instance)
        } else {
            self.simulated.execute(task, instance)
        }
    }
}
