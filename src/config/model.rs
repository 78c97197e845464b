// src/config/model.rs

use serde::Deserialize;

use crate::types::{
    Comparator, FailurePolicy, MeasuredValue, Priority, SupplyMode, TaskId, TieBreak, Voltage,
};

/// Configuration exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [config]
/// tie_break = "fifo"
/// stall_backoff_ms = 100
///
/// [supply]
/// mode = "fixed"
/// voltage = 4200
///
/// [[task]]
/// id = 0
/// name = "camera"
/// execution_time = 1017
/// priority = 3
/// required_voltage = 4161
/// is_root = true
///
///   [[task.edge]]
///   target = 0
///   kind = "timed_rearm"
///   constraint = 10000
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub supply: SupplySection,

    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// A validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub supply: SupplySection,
    pub task: Vec<TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        supply: SupplySection,
        task: Vec<TaskConfig>,
    ) -> Self {
        Self {
            config,
            supply,
            task,
        }
    }

    /// Root tasks in declaration order.
    pub fn root_ids(&self) -> Vec<TaskId> {
        self.task.iter().filter(|t| t.is_root).map(|t| t.id).collect()
    }
}

/// `[config]` section: scheduler-wide behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"fifo"` (default) or `"task_id"`.
    #[serde(default)]
    pub tie_break: TieBreak,

    /// How long the scheduler sleeps before re-reading the voltage when no
    /// ready instance is feasible.
    #[serde(default = "default_stall_backoff_ms")]
    pub stall_backoff_ms: u64,

    /// Upper bound on outgoing edges per task.
    #[serde(default = "default_max_edges_per_task")]
    pub max_edges_per_task: usize,
}

fn default_stall_backoff_ms() -> u64 {
    100
}

fn default_max_edges_per_task() -> usize {
    4
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::default(),
            stall_backoff_ms: default_stall_backoff_ms(),
            max_edges_per_task: default_max_edges_per_task(),
        }
    }
}

/// `[supply]` section: the voltage source used by the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplySection {
    #[serde(default)]
    pub mode: SupplyMode,

    /// Reading returned in `fixed` mode.
    #[serde(default = "default_voltage")]
    pub voltage: Voltage,

    /// Readings replayed in `trace` mode.
    #[serde(default)]
    pub trace: Vec<Voltage>,
}

fn default_voltage() -> Voltage {
    4200
}

impl Default for SupplySection {
    fn default() -> Self {
        Self {
            mode: SupplyMode::default(),
            voltage: default_voltage(),
            trace: Vec::new(),
        }
    }
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub id: TaskId,

    /// Label used in logs; defaults to `task-<id>`.
    #[serde(default)]
    pub name: Option<String>,

    /// Worst-case duration in milliseconds.
    pub execution_time: u64,

    pub priority: Priority,

    /// Minimum supply voltage under which the task completes without brownout.
    pub required_voltage: Voltage,

    #[serde(default)]
    pub is_root: bool,

    /// Offline energy estimate behind `required_voltage` (informational).
    #[serde(default)]
    pub task_energy: Option<u32>,

    #[serde(default)]
    pub on_failure: Option<FailurePolicy>,

    /// Shell command implementing the task body. Simulated when absent.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Regex applied to the body's stdout; capture group 1 is the measured value.
    #[serde(default)]
    pub measure_on_stdout: Option<String>,

    /// Measured values reported by the simulated body, cycled per run.
    #[serde(default)]
    pub measurements: Vec<MeasuredValue>,

    /// Simulated body fails every n-th run (0 or absent: never).
    #[serde(default)]
    pub fail_every: Option<u32>,

    /// Outgoing edges, in evaluation order.
    #[serde(default)]
    pub edge: Vec<EdgeConfig>,
}

impl TaskConfig {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("task-{}", self.id))
    }

    pub fn effective_on_failure(&self) -> FailurePolicy {
        self.on_failure.unwrap_or_default()
    }
}

/// `[[task.edge]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeConfig {
    pub target: TaskId,

    pub kind: EdgeKindConfig,

    /// Period (ms), availability count or threshold bound depending on `kind`.
    /// Required for every kind except `unconditional`, which ignores it.
    #[serde(default)]
    pub constraint: Option<i64>,

    /// Only meaningful for `threshold_compare`; defaults to `le`.
    #[serde(default)]
    pub comparator: Option<Comparator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKindConfig {
    Unconditional,
    TimedRearm,
    Availability,
    ThresholdCompare,
}
