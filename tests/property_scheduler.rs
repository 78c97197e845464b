// tests/property_scheduler.rs

use std::collections::HashSet;

use proptest::prelude::*;
use voltsched::config::ConfigFile;
use voltsched::engine::{Outcome, SchedulerCore, Selection};
use voltsched::types::{TaskId, Timestamp, Voltage};
use voltsched_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

#[derive(Debug, Clone)]
struct TaskSpec {
    priority: u32,
    required_voltage: Voltage,
    /// (target offset, kind selector, constraint seed)
    edges: Vec<(usize, u8, u8)>,
}

// Strategy for a valid task graph.
// Acyclic by construction: edges only point from task i to tasks > i, plus an
// optional timed rearm self-loop on each root.
fn graph_config_strategy(max_tasks: usize) -> impl Strategy<Value = ConfigFile> {
    let task = (
        0u32..10,
        3500u32..4400,
        proptest::collection::vec((any::<usize>(), 0u8..4, any::<u8>()), 0..3),
    )
        .prop_map(|(priority, required_voltage, edges)| TaskSpec {
            priority,
            required_voltage,
            edges,
        });

    (
        proptest::collection::vec(task, 1..=max_tasks),
        proptest::collection::vec(any::<bool>(), max_tasks),
    )
        .prop_map(|(tasks, root_flags)| {
            let n = tasks.len();
            let mut builder = ConfigFileBuilder::new();

            for (i, spec) in tasks.into_iter().enumerate() {
                let id = i as TaskId;
                let is_root = i == 0 || root_flags[i];
                let mut tb = TaskConfigBuilder::new(id, spec.priority, spec.required_voltage)
                    .execution_time(50 + 10 * i as u64);

                if is_root {
                    tb = tb.root().timed_rearm(id, 1_000);
                }

                let later = n - i - 1;
                if later > 0 {
                    for (offset, kind, seed) in spec.edges {
                        let target = (i + 1 + offset % later) as TaskId;
                        tb = match kind {
                            0 => tb.unconditional(target),
                            1 => tb.availability(target, 1 + i64::from(seed % 3)),
                            2 => tb.threshold(target, i64::from(seed % 5), None),
                            _ => tb.timed_rearm(target, 100 + i64::from(seed) * 10),
                        };
                    }
                }
                builder = builder.with_task(tb.build());
            }
            builder.build()
        })
}

/// Drive the core with one voltage sample per step and record every dispatch.
fn drive(cfg: &ConfigFile, voltages: &[Voltage], measured: &[i64]) -> Vec<(TaskId, Timestamp)> {
    let mut core = SchedulerCore::from_config(cfg).expect("core");
    core.bootstrap(0);

    let mut now: Timestamp = 0;
    let mut log = Vec::new();

    for (step, &voltage) in voltages.iter().enumerate() {
        core.poll_timers(now);

        let ready = core.ready();
        let ids: Vec<TaskId> = ready.iter().map(|i| i.task_id).collect();
        let unique: HashSet<TaskId> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len(), "duplicate ready instances: {ids:?}");

        match core.select(voltage).expect("select") {
            Selection::Dispatch {
                task_id,
                priority,
                required_voltage,
            } => {
                assert!(required_voltage <= voltage);
                let best_feasible = ready
                    .iter()
                    .map(|i| core.registry().lookup(i.task_id).unwrap())
                    .filter(|t| t.required_voltage <= voltage)
                    .map(|t| t.priority)
                    .max();
                assert_eq!(Some(priority), best_feasible);

                core.dispatch(task_id, voltage, now).expect("dispatch");
                log.push((task_id, now));
                now += core.registry().lookup(task_id).unwrap().execution_time;

                let value = measured[step % measured.len()];
                core.complete(task_id, Outcome::measured(value), now)
                    .expect("complete");
            }
            Selection::Stall { pending, .. } => {
                assert!(!pending.is_empty());
                assert!(ready.iter().all(|i| {
                    core.registry().lookup(i.task_id).unwrap().required_voltage > voltage
                }));
                core.record_stall();
                now += 100;
            }
            Selection::Idle => {
                assert!(ready.is_empty());
                now = core.next_timer_due().unwrap_or(now + 100).max(now);
            }
        }
    }

    log
}

proptest! {
    #[test]
    fn dispatches_respect_voltage_priority_and_dedup(
        cfg in graph_config_strategy(6),
        voltages in proptest::collection::vec(3400u32..4500, 1..80),
        measured in proptest::collection::vec(0i64..6, 1..8),
    ) {
        let log = drive(&cfg, &voltages, &measured);
        prop_assert!(log.len() <= voltages.len());
    }

    #[test]
    fn same_inputs_give_same_schedule(
        cfg in graph_config_strategy(6),
        voltages in proptest::collection::vec(3400u32..4500, 1..60),
        measured in proptest::collection::vec(0i64..6, 1..8),
    ) {
        let first = drive(&cfg, &voltages, &measured);
        let second = drive(&cfg, &voltages, &measured);
        prop_assert_eq!(first, second);
    }
}
