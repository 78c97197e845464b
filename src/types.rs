// src/types.rs

use serde::Deserialize;

/// Stable task identity; also the index used by the registry.
pub type TaskId = u32;

/// Supply voltage in the ADC-equivalent units the thresholds are expressed in.
pub type Voltage = u32;

/// Monotonic time in milliseconds.
pub type Timestamp = u64;

/// Scheduling priority. Higher number wins.
pub type Priority = u32;

/// Value reported by a task body, compared by `ThresholdCompare` edges.
pub type MeasuredValue = i64;

/// How to order ready, feasible instances that share the same priority.
///
/// - `Fifo`: the instance that was enqueued first wins (default).
/// - `TaskId`: the lowest task id wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    Fifo,
    TaskId,
}

impl Default for TieBreak {
    fn default() -> Self {
        TieBreak::Fifo
    }
}

/// What happens to a task's outgoing edges when its body reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// No edge is evaluated; partial results never reach children.
    Suppress,
    /// Only `TimedRearm` edges are evaluated so periodic loops keep going.
    Rearm,
    /// Edges are evaluated as if the run had succeeded.
    Propagate,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Suppress
    }
}

/// Comparison applied by a `ThresholdCompare` edge as `measured <op> bound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Le,
    Lt,
    Ge,
    Gt,
    Eq,
}

impl Default for Comparator {
    fn default() -> Self {
        Comparator::Le
    }
}

impl Comparator {
    pub fn holds(self, measured: MeasuredValue, bound: MeasuredValue) -> bool {
        match self {
            Comparator::Le => measured <= bound,
            Comparator::Lt => measured < bound,
            Comparator::Ge => measured >= bound,
            Comparator::Gt => measured > bound,
            Comparator::Eq => measured == bound,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Le => "<=",
            Comparator::Lt => "<",
            Comparator::Ge => ">=",
            Comparator::Gt => ">",
            Comparator::Eq => "==",
        }
    }
}

/// Where the CLI gets its voltage readings from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplyMode {
    /// A single constant reading.
    Fixed,
    /// Replay `trace`, one value per read, holding the last one.
    Trace,
}

impl Default for SupplyMode {
    fn default() -> Self {
        SupplyMode::Fixed
    }
}
