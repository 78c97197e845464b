// tests/dependency_graph.rs

use voltsched::config::ConfigFile;
use voltsched::dag::{DependencyGraph, EdgeKey, ReadyQueue, TaskRegistry};
use voltsched::engine::Outcome;
use voltsched::errors::SchedError;
use voltsched::types::{Comparator, FailurePolicy};
use voltsched_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use voltsched_test_utils::init_tracing;

struct Harness {
    registry: TaskRegistry,
    graph: DependencyGraph,
    queue: ReadyQueue,
}

impl Harness {
    fn new(cfg: &ConfigFile) -> Self {
        Self {
            registry: TaskRegistry::from_config(cfg).unwrap(),
            graph: DependencyGraph::new(),
            queue: ReadyQueue::new(),
        }
    }

    fn complete(&mut self, task: u32, outcome: Outcome, now: u64) -> voltsched::dag::CompletionStep {
        self.graph
            .on_task_complete(&self.registry, &mut self.queue, task, &outcome, now)
            .unwrap()
    }

    fn ready_ids(&self) -> Vec<u32> {
        self.queue.snapshot().iter().map(|i| i.task_id).collect()
    }
}

fn producer_consumer(kind_builder: impl FnOnce(TaskConfigBuilder) -> TaskConfigBuilder) -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task(kind_builder(TaskConfigBuilder::new(0, 1, 4000).root()).build())
        .with_task(TaskConfigBuilder::new(1, 1, 4000).build())
        .build()
}

#[test]
fn unconditional_edge_enqueues_child_immediately() {
    init_tracing();
    let cfg = producer_consumer(|t| t.unconditional(1));
    let mut h = Harness::new(&cfg);

    let step = h.complete(0, Outcome::success(), 10);

    assert_eq!(step.enqueued, vec![1]);
    assert_eq!(h.ready_ids(), vec![1]);
    assert_eq!(h.queue.snapshot()[0].enqueue_time, 10);
}

#[test]
fn terminal_task_enqueues_nothing() {
    let cfg = producer_consumer(|t| t.unconditional(1));
    let mut h = Harness::new(&cfg);

    let step = h.complete(1, Outcome::success(), 0);

    assert!(step.is_empty());
    assert!(h.queue.is_empty());
}

#[test]
fn bootstrap_makes_every_root_ready() {
    let cfg = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new(0, 1, 4000).root().build())
        .with_task(TaskConfigBuilder::new(1, 1, 4000).build())
        .with_task(TaskConfigBuilder::new(2, 1, 4000).root().build())
        .build();
    let mut h = Harness::new(&cfg);

    let step = h.graph.bootstrap(&h.registry, &mut h.queue, 0);

    assert_eq!(step.enqueued, vec![0, 2]);
    assert_eq!(h.ready_ids(), vec![0, 2]);
}

#[test]
fn timed_rearm_waits_full_period_and_never_double_fires() {
    let cfg = producer_consumer(|t| t.timed_rearm(0, 10_000));
    let mut h = Harness::new(&cfg);
    let key = EdgeKey::new(0, 0);

    // First completion arms the timer instead of firing.
    let step = h.complete(0, Outcome::success(), 1_000);
    assert!(step.enqueued.is_empty());
    assert_eq!(step.deferred, vec![(0, 11_000)]);
    assert_eq!(h.graph.next_timer_due(), Some(11_000));

    // Repeated checks before the deadline do nothing.
    for now in [1_001, 5_000, 10_999] {
        let polled = h.graph.poll_timers(&mut h.queue, now);
        assert!(polled.is_empty(), "fired early at {now}");
    }
    assert!(h.queue.is_empty());

    // Another completion while the timer is pending does not re-arm it.
    let step = h.complete(0, Outcome::success(), 2_000);
    assert!(step.deferred.is_empty());
    assert_eq!(h.graph.next_timer_due(), Some(11_000));

    let polled = h.graph.poll_timers(&mut h.queue, 11_000);
    assert_eq!(polled.enqueued, vec![0]);
    assert_eq!(h.graph.last_fire(key), Some(11_000));

    // Fired exactly once for this window.
    let polled = h.graph.poll_timers(&mut h.queue, 11_500);
    assert!(polled.is_empty());
    assert!(!h.graph.has_pending_timers());
}

#[test]
fn timed_rearm_counts_period_from_last_firing() {
    let cfg = producer_consumer(|t| t.timed_rearm(0, 10_000));
    let mut h = Harness::new(&cfg);

    h.complete(0, Outcome::success(), 1_000);
    h.graph.poll_timers(&mut h.queue, 11_000);
    h.queue.remove(0);

    // Completes 1s after firing: next due is last_fire + period.
    let step = h.complete(0, Outcome::success(), 12_000);
    assert_eq!(step.deferred, vec![(0, 21_000)]);

    // A completion long after the period has elapsed fires straight away.
    h.graph.poll_timers(&mut h.queue, 21_000);
    h.queue.remove(0);
    let step = h.complete(0, Outcome::success(), 40_000);
    assert!(step.deferred.is_empty());
    assert_eq!(step.enqueued, vec![0]);
}

#[test]
fn availability_enqueues_once_per_threshold_and_resets() {
    let cfg = producer_consumer(|t| t.availability(1, 2));
    let mut h = Harness::new(&cfg);
    let key = EdgeKey::new(0, 0);

    let step = h.complete(0, Outcome::success(), 0);
    assert!(step.enqueued.is_empty());
    assert_eq!(h.graph.availability_count(key), 1);

    let step = h.complete(0, Outcome::success(), 1);
    assert_eq!(step.enqueued, vec![1]);
    assert_eq!(h.graph.availability_count(key), 0);
}

#[test]
fn availability_does_not_duplicate_a_pending_child() {
    let cfg = producer_consumer(|t| t.availability(1, 1));
    let mut h = Harness::new(&cfg);
    let key = EdgeKey::new(0, 0);

    let first = h.complete(0, Outcome::success(), 0);
    let second = h.complete(0, Outcome::success(), 5);
    let third = h.complete(0, Outcome::success(), 9);

    assert_eq!(first.enqueued, vec![1]);
    assert_eq!(second.deduplicated, vec![1]);
    assert_eq!(third.deduplicated, vec![1]);
    assert_eq!(h.ready_ids(), vec![1]);
    assert_eq!(h.graph.availability_count(key), 0);

    // Consumer runs; nothing left over to spawn a phantom instance.
    h.queue.remove(1);
    let step = h.complete(1, Outcome::success(), 20);
    assert!(step.is_empty());
    assert!(h.queue.is_empty());

    // Next producer completion makes exactly one new instance.
    let step = h.complete(0, Outcome::success(), 30);
    assert_eq!(step.enqueued, vec![1]);
}

#[test]
fn threshold_compare_uses_reported_value() {
    let cfg = producer_consumer(|t| t.threshold(1, 3, None));
    let mut h = Harness::new(&cfg);

    let step = h.complete(0, Outcome::measured(4), 0);
    assert!(step.enqueued.is_empty());
    assert!(h.queue.is_empty());
    assert_eq!(h.graph.last_measured(EdgeKey::new(0, 0)), Some(4));

    let step = h.complete(0, Outcome::measured(3), 1);
    assert_eq!(step.enqueued, vec![1]);
}

#[test]
fn threshold_compare_without_value_does_not_fire() {
    let cfg = producer_consumer(|t| t.threshold(1, 3, None));
    let mut h = Harness::new(&cfg);

    let step = h.complete(0, Outcome::success(), 0);

    assert!(step.enqueued.is_empty());
    assert_eq!(h.graph.last_measured(EdgeKey::new(0, 0)), None);
}

#[test]
fn threshold_compare_accepts_other_comparators() {
    let cfg = producer_consumer(|t| t.threshold(1, 10, Some(Comparator::Gt)));
    let mut h = Harness::new(&cfg);

    assert!(h.complete(0, Outcome::measured(10), 0).enqueued.is_empty());
    assert_eq!(h.complete(0, Outcome::measured(11), 1).enqueued, vec![1]);
}

#[test]
fn failed_run_suppresses_children_by_default() {
    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new(0, 1, 4000)
                .root()
                .timed_rearm(0, 100)
                .unconditional(1)
                .build(),
        )
        .with_task(TaskConfigBuilder::new(1, 1, 4000).build())
        .build();
    let mut h = Harness::new(&cfg);

    let step = h.complete(0, Outcome::failed(), 0);

    assert!(step.suppressed);
    assert!(step.is_empty());
    assert!(!h.graph.has_pending_timers());
}

#[test]
fn rearm_policy_keeps_the_periodic_loop_alive() {
    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new(0, 1, 4000)
                .root()
                .on_failure(FailurePolicy::Rearm)
                .timed_rearm(0, 100)
                .unconditional(1)
                .build(),
        )
        .with_task(TaskConfigBuilder::new(1, 1, 4000).build())
        .build();
    let mut h = Harness::new(&cfg);

    let step = h.complete(0, Outcome::failed(), 0);

    assert!(step.suppressed);
    assert!(step.enqueued.is_empty());
    assert_eq!(step.deferred, vec![(0, 100)]);
}

#[test]
fn propagate_policy_evaluates_edges_after_failure() {
    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new(0, 1, 4000)
                .root()
                .on_failure(FailurePolicy::Propagate)
                .unconditional(1)
                .build(),
        )
        .with_task(TaskConfigBuilder::new(1, 1, 4000).build())
        .build();
    let mut h = Harness::new(&cfg);

    let step = h.complete(0, Outcome::failed(), 0);

    assert!(!step.suppressed);
    assert_eq!(step.enqueued, vec![1]);
}

#[test]
fn unknown_task_is_reported() {
    let cfg = producer_consumer(|t| t.unconditional(1));
    let mut h = Harness::new(&cfg);

    let err = h
        .graph
        .on_task_complete(&h.registry, &mut h.queue, 42, &Outcome::success(), 0)
        .unwrap_err();
    assert!(matches!(err, SchedError::UnknownTaskId(42, _)));

    let err = h.graph.trigger(&h.registry, &mut h.queue, 42, 0).unwrap_err();
    assert!(matches!(err, SchedError::UnknownTaskId(42, _)));
}
