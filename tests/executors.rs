// tests/executors.rs

use regex::Regex;
use voltsched::dag::{Task, TaskInstance, TaskRegistry};
use voltsched::engine::Outcome;
use voltsched::exec::task_runner::parse_measure;
use voltsched::exec::{CommandExecutor, ConfiguredExecutor, SimulatedExecutor, TaskExecutor};
use voltsched_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use voltsched_test_utils::init_tracing;

fn instance_of(task: &Task) -> TaskInstance {
    TaskInstance::new(task.id, 0, 0)
}

#[test]
fn parse_measure_reads_first_capture_group() {
    let re = Regex::new(r"score=(-?\d+)").unwrap();

    assert_eq!(parse_measure(&re, "score=2"), Some(2));
    assert_eq!(parse_measure(&re, "frame ok, score=-4 done"), Some(-4));
    assert_eq!(parse_measure(&re, "no score here"), None);
}

#[tokio::test]
async fn simulated_executor_cycles_measurements_and_fails_on_schedule() {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new(0, 1, 4000)
                .root()
                .measurements(&[2, 5])
                .build(),
        )
        .build();
    let registry = TaskRegistry::from_config(&cfg).unwrap();
    let task = registry.lookup(0).unwrap().clone();
    let mut exec = SimulatedExecutor::from_config(&cfg, false);

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(exec.execute(&task, instance_of(&task)).await.unwrap());
    }

    assert_eq!(
        seen,
        vec![Outcome::measured(2), Outcome::measured(5), Outcome::measured(2)]
    );
    assert_eq!(exec.runs_of(0), 3);
}

#[tokio::test]
async fn simulated_fail_every_reports_failure() {
    let mut raw_task = TaskConfigBuilder::new(0, 1, 4000).root().build();
    raw_task.fail_every = Some(2);
    let cfg = ConfigFileBuilder::new().with_task(raw_task).build();
    let registry = TaskRegistry::from_config(&cfg).unwrap();
    let task = registry.lookup(0).unwrap().clone();
    let mut exec = SimulatedExecutor::from_config(&cfg, false);

    let first = exec.execute(&task, instance_of(&task)).await.unwrap();
    let second = exec.execute(&task, instance_of(&task)).await.unwrap();

    assert!(first.success);
    assert_eq!(second, Outcome::failed());
}

#[cfg(unix)]
#[tokio::test]
async fn command_executor_reports_exit_status_and_measurement() {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new(0, 1, 4000)
                .root()
                .cmd("echo warming up; echo score=2")
                .measure_on_stdout(r"score=(\d+)")
                .unconditional(1)
                .build(),
        )
        .with_task(TaskConfigBuilder::new(1, 1, 4000).cmd("exit 3").build())
        .build();
    let registry = TaskRegistry::from_config(&cfg).unwrap();
    let mut exec = CommandExecutor::from_config(&cfg).unwrap();

    let camera = registry.lookup(0).unwrap().clone();
    let outcome = exec.execute(&camera, instance_of(&camera)).await.unwrap();
    assert_eq!(outcome, Outcome::measured(2));

    let failing = registry.lookup(1).unwrap().clone();
    let outcome = exec.execute(&failing, instance_of(&failing)).await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.measured_value, None);
}

#[cfg(unix)]
#[tokio::test]
async fn configured_executor_routes_by_body() {
    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new(0, 1, 4000)
                .root()
                .cmd("false")
                .unconditional(1)
                .build(),
        )
        .with_task(
            TaskConfigBuilder::new(1, 1, 4000)
                .measurements(&[7])
                .build(),
        )
        .build();
    let registry = TaskRegistry::from_config(&cfg).unwrap();
    let mut exec = ConfiguredExecutor::from_config(&cfg, false).unwrap();

    let with_cmd = registry.lookup(0).unwrap().clone();
    let simulated = registry.lookup(1).unwrap().clone();

    assert!(!exec.execute(&with_cmd, instance_of(&with_cmd)).await.unwrap().success);
    assert_eq!(
        exec.execute(&simulated, instance_of(&simulated)).await.unwrap(),
        Outcome::measured(7)
    );
}

#[cfg(unix)]
#[tokio::test]
async fn command_executor_tolerates_non_utf8_output() {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new(0, 1, 4000)
                .root()
                .cmd(r"printf '\377\376 raw frame\n'; echo score=2")
                .measure_on_stdout(r"score=(\d+)")
                .build(),
        )
        .build();
    let registry = TaskRegistry::from_config(&cfg).unwrap();
    let mut exec = CommandExecutor::from_config(&cfg).unwrap();
    let camera = registry.lookup(0).unwrap().clone();

    let outcome = exec.execute(&camera, instance_of(&camera)).await.unwrap();

    assert_eq!(outcome, Outcome::measured(2));
}
