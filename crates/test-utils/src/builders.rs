#![allow(dead_code)]

use voltsched::config::{
    ConfigFile, ConfigSection, EdgeConfig, EdgeKindConfig, RawConfigFile, SupplySection,
    TaskConfig,
};
use voltsched::types::{Comparator, FailurePolicy, MeasuredValue, Priority, TaskId, TieBreak, Voltage};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                supply: SupplySection::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.config.task.push(task);
        self
    }

    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.config.config.tie_break = tie_break;
        self
    }

    pub fn stall_backoff_ms(mut self, ms: u64) -> Self {
        self.config.config.stall_backoff_ms = ms;
        self
    }

    pub fn max_edges_per_task(mut self, n: usize) -> Self {
        self.config.config.max_edges_per_task = n;
        self
    }

    pub fn fixed_voltage(mut self, voltage: Voltage) -> Self {
        self.config.supply.voltage = voltage;
        self
    }

    /// The raw config, for tests that exercise validation failures.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(id: TaskId, priority: Priority, required_voltage: Voltage) -> Self {
        Self {
            task: TaskConfig {
                id,
                name: None,
                execution_time: 100,
                priority,
                required_voltage,
                is_root: false,
                task_energy: None,
                on_failure: None,
                cmd: None,
                measure_on_stdout: None,
                measurements: Vec::new(),
                fail_every: None,
                edge: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.task.name = Some(name.to_string());
        self
    }

    pub fn root(mut self) -> Self {
        self.task.is_root = true;
        self
    }

    pub fn execution_time(mut self, ms: u64) -> Self {
        self.task.execution_time = ms;
        self
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.task.on_failure = Some(policy);
        self
    }

    pub fn measurements(mut self, values: &[MeasuredValue]) -> Self {
        self.task.measurements = values.to_vec();
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.task.cmd = Some(cmd.to_string());
        self
    }

    pub fn measure_on_stdout(mut self, pattern: &str) -> Self {
        self.task.measure_on_stdout = Some(pattern.to_string());
        self
    }

    pub fn unconditional(self, target: TaskId) -> Self {
        self.edge(target, EdgeKindConfig::Unconditional, 0)
    }

    pub fn timed_rearm(self, target: TaskId, period: i64) -> Self {
        self.edge(target, EdgeKindConfig::TimedRearm, period)
    }

    pub fn availability(self, target: TaskId, required: i64) -> Self {
        self.edge(target, EdgeKindConfig::Availability, required)
    }

    pub fn threshold(mut self, target: TaskId, bound: i64, comparator: Option<Comparator>) -> Self {
        self.task.edge.push(EdgeConfig {
            target,
            kind: EdgeKindConfig::ThresholdCompare,
            constraint: Some(bound),
            comparator,
        });
        self
    }

    pub fn edge(mut self, target: TaskId, kind: EdgeKindConfig, constraint: i64) -> Self {
        self.task.edge.push(EdgeConfig {
            target,
            kind,
            constraint: Some(constraint),
            comparator: None,
        });
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
