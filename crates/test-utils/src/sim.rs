//! Virtual-time driver for `SchedulerCore`, for tests that want exact
//! timestamps without going through Tokio.

use voltsched::engine::{Outcome, SchedulerCore, Selection};
use voltsched::types::{TaskId, Timestamp, Voltage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimDispatch {
    pub task_id: TaskId,
    pub at: Timestamp,
    pub voltage: Voltage,
}

/// How a simulation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEnd {
    /// Simulated time passed `until`.
    Deadline,
    /// Ready work exists but can never run: infeasible and no timer pending.
    PermanentStall(Vec<TaskId>),
    /// Nothing ready and nothing pending.
    Idle,
}

/// Run the core at a fixed voltage from `start` until `until`.
///
/// Each dispatched task takes its `execution_time`; idle and stalled periods
/// jump straight to the next rearm timer. The core must already be
/// bootstrapped (or triggered) by the caller.
pub fn run_fixed_voltage(
    core: &mut SchedulerCore,
    voltage: Voltage,
    start: Timestamp,
    until: Timestamp,
    mut outcome_for: impl FnMut(TaskId) -> Outcome,
) -> (Vec<SimDispatch>, SimEnd) {
    let mut now = start;
    let mut log = Vec::new();

    loop {
        if now > until {
            return (log, SimEnd::Deadline);
        }

        core.poll_timers(now);

        match core.select(voltage).expect("select") {
            Selection::Dispatch { task_id, .. } => {
                core.dispatch(task_id, voltage, now).expect("dispatch");
                log.push(SimDispatch {
                    task_id,
                    at: now,
                    voltage,
                });
                now += core.registry().lookup(task_id).expect("lookup").execution_time;
                core.complete(task_id, outcome_for(task_id), now)
                    .expect("complete");
            }
            Selection::Stall { pending, .. } => match core.next_timer_due() {
                Some(due) => now = now.max(due),
                None => return (log, SimEnd::PermanentStall(pending)),
            },
            Selection::Idle => match core.next_timer_due() {
                Some(due) => now = now.max(due),
                None => return (log, SimEnd::Idle),
            },
        }
    }
}

/// Task ids of a dispatch log, in order.
pub fn ids(log: &[SimDispatch]) -> Vec<TaskId> {
    log.iter().map(|d| d.task_id).collect()
}
