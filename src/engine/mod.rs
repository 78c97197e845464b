// src/engine/mod.rs

//! Scheduling engine for voltsched.
//!
//! The pure, synchronous decision logic lives in [`core`]: given the ready
//! queue and one voltage sample it decides what (if anything) may run. The
//! async shell in [`runtime`] owns the collaborators (sensor, clock,
//! executor, event channel) and drives the select -> dispatch -> complete
//! cycle.

use std::time::Duration;

use crate::types::{MeasuredValue, Priority, TaskId, Voltage};

/// What a task body reports when it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    pub success: bool,
    /// Value consumed by `ThresholdCompare` edges, if the body produced one.
    pub measured_value: Option<MeasuredValue>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            success: true,
            measured_value: None,
        }
    }

    pub fn measured(value: MeasuredValue) -> Self {
        Self {
            success: true,
            measured_value: Some(value),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            measured_value: None,
        }
    }
}

/// Result of the select phase for one voltage sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Run this task next.
    Dispatch {
        task_id: TaskId,
        priority: Priority,
        required_voltage: Voltage,
    },
    /// Work is ready but none of it is safe at the current voltage.
    Stall {
        voltage: Voltage,
        pending: Vec<TaskId>,
    },
    /// Nothing is ready.
    Idle,
}

/// Counters kept by the core, logged when the runtime stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub dispatched: u64,
    pub completed: u64,
    pub failed: u64,
    pub stalls: u64,
}

/// Events flowing into the runtime from outside the scheduling loop.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Make a task ready now (external signal).
    TaskTriggered { task: TaskId },
    /// Stop after the current dispatch, if any.
    ShutdownRequested,
}

/// Knobs for the async runtime loop.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Sleep between voltage re-checks while stalled.
    pub stall_backoff: Duration,
    /// Exit once nothing is ready and no rearm timer is pending.
    pub exit_when_idle: bool,
    /// Stop after this many dispatches.
    pub max_dispatches: Option<u64>,
    /// Stop after this many stalls in a row without a dispatch.
    pub max_consecutive_stalls: Option<u32>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            stall_backoff: Duration::from_millis(100),
            exit_when_idle: false,
            max_dispatches: None,
            max_consecutive_stalls: None,
        }
    }
}

pub mod core;
pub mod runtime;

pub use core::SchedulerCore;
pub use runtime::Runtime;
