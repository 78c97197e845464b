// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::exec::TaskExecutor;
use crate::sensor::{Clock, VoltageSensor};
use crate::types::{TaskId, Voltage};

use super::core::SchedulerCore;
use super::{Outcome, RuntimeEvent, RuntimeOptions, SchedulerStats, Selection};

/// Drives the [`SchedulerCore`] against real (or fake) collaborators.
///
/// One loop iteration: drain external events, fire due rearm timers, sample
/// the voltage, select, then either dispatch and await the executor or back
/// off. There is exactly one task body running at any time and completions
/// are handled before the next selection.
pub struct Runtime<E: TaskExecutor, S: VoltageSensor, C: Clock> {
    core: SchedulerCore,
    executor: E,
    sensor: S,
    clock: C,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    events_open: bool,
    options: RuntimeOptions,
}

impl<E: TaskExecutor, S: VoltageSensor, C: Clock> fmt::Debug for Runtime<E, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<E: TaskExecutor, S: VoltageSensor, C: Clock> Runtime<E, S, C> {
    pub fn new(
        core: SchedulerCore,
        executor: E,
        sensor: S,
        clock: C,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            core,
            executor,
            sensor,
            clock,
            event_rx,
            events_open: true,
            options,
        }
    }

    /// Main scheduling loop. Returns the final counters.
    pub async fn run(mut self) -> Result<SchedulerStats> {
        info!("voltsched runtime started");

        let bootstrap = self.core.bootstrap(self.clock.now());
        info!(roots = ?bootstrap.enqueued, "root tasks ready");

        let mut consecutive_stalls: u32 = 0;

        loop {
            if !self.drain_events()? {
                info!("shutdown requested; stopping runtime");
                break;
            }

            if let Some(max) = self.options.max_dispatches {
                if self.core.stats().dispatched >= max {
                    info!(max, "dispatch limit reached; stopping runtime");
                    break;
                }
            }

            let now = self.clock.now();
            self.core.poll_timers(now);

            let voltage = self.sensor.read_voltage();

            match self.core.select(voltage)? {
                Selection::Dispatch { task_id, .. } => {
                    consecutive_stalls = 0;
                    self.dispatch_one(task_id, voltage).await?;
                }
                Selection::Stall { voltage, pending } => {
                    self.core.record_stall();
                    consecutive_stalls += 1;
                    debug!(
                        voltage,
                        ?pending,
                        backoff_ms = self.options.stall_backoff.as_millis() as u64,
                        "no feasible task; waiting for recharge"
                    );

                    if let Some(max) = self.options.max_consecutive_stalls {
                        if consecutive_stalls >= max {
                            warn!(
                                voltage,
                                ?pending,
                                stalls = consecutive_stalls,
                                "stall limit reached; stopping runtime"
                            );
                            break;
                        }
                    }

                    if !self.wait(Some(self.options.stall_backoff)).await? {
                        break;
                    }
                }
                Selection::Idle => match self.core.next_timer_due() {
                    Some(due) => {
                        let sleep_ms = due.saturating_sub(now);
                        debug!(due, sleep_ms, "idle until next rearm");
                        if !self.wait(Some(Duration::from_millis(sleep_ms))).await? {
                            break;
                        }
                    }
                    None if self.options.exit_when_idle => {
                        info!("nothing ready and no rearm pending; exiting");
                        break;
                    }
                    None => {
                        if !self.events_open {
                            info!("idle with no event source left; exiting");
                            break;
                        }
                        debug!("idle; waiting for external trigger");
                        if !self.wait(None).await? {
                            break;
                        }
                    }
                },
            }
        }

        let stats = self.core.stats();
        info!(
            dispatched = stats.dispatched,
            completed = stats.completed,
            failed = stats.failed,
            stalls = stats.stalls,
            "runtime exiting"
        );
        Ok(stats)
    }

    /// Read-only access for callers that keep the runtime around.
    pub fn core(&self) -> &SchedulerCore {
        &self.core
    }

    async fn dispatch_one(&mut self, task_id: TaskId, voltage: Voltage) -> Result<()> {
        let started = self.clock.now();
        let instance = self.core.dispatch(task_id, voltage, started)?;
        let task = self.core.registry().lookup(task_id)?.clone();

        let outcome = match self.executor.execute(&task, instance).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    task_id,
                    task = %task.name,
                    error = %err,
                    "executor error; treating run as failed"
                );
                Outcome::failed()
            }
        };

        let finished = self.clock.now();
        let step = self.core.complete(task_id, outcome, finished)?;
        debug!(
            task_id,
            elapsed = finished.saturating_sub(started),
            enqueued = ?step.enqueued,
            "dispatch cycle complete"
        );
        Ok(())
    }

    /// Drain queued events without blocking. Returns `false` on shutdown.
    fn drain_events(&mut self) -> Result<bool> {
        while self.events_open {
            match self.event_rx.try_recv() {
                Ok(event) => {
                    if !self.handle_event(event)? {
                        return Ok(false);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("runtime event channel closed");
                    self.events_open = false;
                }
            }
        }
        Ok(true)
    }

    /// Sleep for `timeout` (or until an event arrives). `None` waits for an
    /// event only. Returns `false` on shutdown.
    async fn wait(&mut self, timeout: Option<Duration>) -> Result<bool> {
        if !self.events_open {
            if let Some(d) = timeout {
                tokio::time::sleep(d).await;
                return Ok(true);
            }
            return Ok(false);
        }

        let received = match timeout {
            Some(d) => {
                tokio::select! {
                    _ = tokio::time::sleep(d) => None,
                    event = self.event_rx.recv() => Some(event),
                }
            }
            None => Some(self.event_rx.recv().await),
        };

        match received {
            None => Ok(true),
            Some(Some(event)) => self.handle_event(event),
            Some(None) => {
                debug!("runtime event channel closed");
                self.events_open = false;
                Ok(true)
            }
        }
    }

    fn handle_event(&mut self, event: RuntimeEvent) -> Result<bool> {
        debug!(?event, "runtime received event");
        match event {
            RuntimeEvent::TaskTriggered { task } => {
                let now = self.clock.now();
                if let Err(err) = self.core.trigger(task, now) {
                    warn!(task, error = %err, "trigger for unknown task; ignoring");
                }
                Ok(true)
            }
            RuntimeEvent::ShutdownRequested => Ok(false),
        }
    }
}
