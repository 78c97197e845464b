// src/dag/task.rs

//! Static task and edge definitions.
//!
//! Everything in here is immutable once the registry is built. Runtime state
//! (availability counters, rearm timestamps) lives in
//! [`crate::dag::graph::DependencyGraph`].

use crate::config::model::{EdgeConfig, EdgeKindConfig, TaskConfig};
use crate::errors::{Result, SchedError};
use crate::types::{
    Comparator, FailurePolicy, MeasuredValue, Priority, TaskId, Timestamp, Voltage,
};

/// Readiness condition carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Fires on every completion of the parent.
    Unconditional,
    /// Fires once `period` ms have passed since the edge last fired.
    TimedRearm { period: Timestamp },
    /// Fires once the parent has completed `required` times since the last firing.
    Availability { required: u32 },
    /// Fires when the parent's measured value satisfies `comparator` against `bound`.
    ThresholdCompare {
        bound: MeasuredValue,
        comparator: Comparator,
    },
}

impl EdgeKind {
    pub fn is_timed_rearm(&self) -> bool {
        matches!(self, EdgeKind::TimedRearm { .. })
    }
}

/// Directed dependency from a parent task to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub target: TaskId,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(target: TaskId, kind: EdgeKind) -> Self {
        Self { target, kind }
    }

    /// Convert a config edge, checking that its constraint fits the kind.
    pub fn from_config(parent: TaskId, index: usize, cfg: &EdgeConfig) -> Result<Self> {
        let constraint = || {
            cfg.constraint.ok_or_else(|| {
                SchedError::ConfigError(format!(
                    "edge #{index} of task {parent}: {:?} edge needs a `constraint`",
                    cfg.kind
                ))
            })
        };

        let kind = match cfg.kind {
            EdgeKindConfig::Unconditional => EdgeKind::Unconditional,
            EdgeKindConfig::TimedRearm => {
                let raw = constraint()?;
                let period = Timestamp::try_from(raw).map_err(|_| {
                    SchedError::ConfigError(format!(
                        "edge #{index} of task {parent}: timed_rearm period must be >= 0 (got {raw})"
                    ))
                })?;
                // A zero-period self-loop would re-enqueue its task on every completion.
                if period == 0 && cfg.target == parent {
                    return Err(SchedError::ConfigError(format!(
                        "edge #{index} of task {parent}: timed_rearm self-loop needs a period > 0"
                    )));
                }
                EdgeKind::TimedRearm { period }
            }
            EdgeKindConfig::Availability => {
                let raw = constraint()?;
                let required = u32::try_from(raw)
                    .ok()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| {
                        SchedError::ConfigError(format!(
                            "edge #{index} of task {parent}: availability count must be >= 1 (got {raw})"
                        ))
                    })?;
                EdgeKind::Availability { required }
            }
            EdgeKindConfig::ThresholdCompare => EdgeKind::ThresholdCompare {
                bound: constraint()?,
                comparator: cfg.comparator.unwrap_or_default(),
            },
        };

        Ok(Self::new(cfg.target, kind))
    }
}

/// A node of the application graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Worst-case duration in ms. Not used for feasibility.
    pub execution_time: u64,
    pub priority: Priority,
    pub required_voltage: Voltage,
    pub is_root: bool,
    pub task_energy: Option<u32>,
    pub on_failure: FailurePolicy,
    pub edges: Vec<Edge>,
}

impl Task {
    pub fn from_config(cfg: &TaskConfig) -> Result<Self> {
        let edges = cfg
            .edge
            .iter()
            .enumerate()
            .map(|(index, e)| Edge::from_config(cfg.id, index, e))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: cfg.id,
            name: cfg.display_name(),
            execution_time: cfg.execution_time,
            priority: cfg.priority,
            required_voltage: cfg.required_voltage,
            is_root: cfg.is_root,
            task_energy: cfg.task_energy,
            on_failure: cfg.effective_on_failure(),
            edges,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.edges.is_empty()
    }

    /// Whether the task can run safely at `voltage`.
    pub fn is_feasible_at(&self, voltage: Voltage) -> bool {
        self.required_voltage <= voltage
    }
}
