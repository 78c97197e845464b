// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod sensor;
pub mod types;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{EdgeKind, TaskRegistry};
use crate::engine::{Runtime, RuntimeEvent, RuntimeOptions, SchedulerCore};
use crate::exec::ConfiguredExecutor;
use crate::sensor::{FixedVoltageSensor, TokioClock, VoltageSensor, sensor_from_config};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - task registry and scheduler core
/// - voltage sensor, clock and executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        let registry = TaskRegistry::from_config(&cfg)?;
        print_dry_run(&cfg, &registry);
        return Ok(());
    }

    let core = SchedulerCore::from_config(&cfg)?;
    info!(
        tasks = core.registry().len(),
        roots = ?cfg.root_ids(),
        tie_break = ?core.tie_break(),
        "task registry loaded"
    );

    let sensor: Box<dyn VoltageSensor> = match args.voltage {
        Some(v) => Box::new(FixedVoltageSensor::new(v)),
        None => sensor_from_config(&cfg.supply),
    };

    let executor = ConfiguredExecutor::from_config(&cfg, !args.fast)?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            request_shutdown(&tx).await;
        });
    }

    let options = RuntimeOptions {
        stall_backoff: Duration::from_millis(cfg.config.stall_backoff_ms),
        exit_when_idle: args.exit_when_idle,
        max_dispatches: args.max_steps,
        max_consecutive_stalls: args.max_stalls,
    };

    let runtime = Runtime::new(core, executor, sensor, TokioClock::new(), rt_rx, options);
    runtime.run().await?;
    Ok(())
}

/// Ask the runtime to stop. Returns `false` if the runtime is already gone.
pub async fn request_shutdown(tx: &mpsc::Sender<RuntimeEvent>) -> bool {
    match tx.send(RuntimeEvent::ShutdownRequested).await {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "runtime channel closed; shutdown request dropped");
            false
        }
    }
}

/// Print the validated task table and edges.
fn print_dry_run(cfg: &ConfigFile, registry: &TaskRegistry) {
    println!("voltsched dry-run");
    println!("  config.tie_break = {:?}", cfg.config.tie_break);
    println!("  config.stall_backoff_ms = {}", cfg.config.stall_backoff_ms);
    println!("  supply.mode = {:?}", cfg.supply.mode);
    println!();

    println!("tasks ({}):", registry.len());
    for task in registry.tasks() {
        println!("  - [{}] {}", task.id, task.name);
        println!(
            "      priority: {}  required_voltage: {}  execution_time: {}",
            task.priority, task.required_voltage, task.execution_time
        );
        if task.is_root {
            println!("      root: true");
        }
        if let Some(energy) = task.task_energy {
            println!("      task_energy: {energy}");
        }
        for edge in task.edges.iter() {
            let target = registry.name_of(edge.target);
            match edge.kind {
                EdgeKind::Unconditional => println!("      -> {target} (unconditional)"),
                EdgeKind::TimedRearm { period } => {
                    println!("      -> {target} (timed rearm every {period} ms)")
                }
                EdgeKind::Availability { required } => {
                    println!("      -> {target} (after {required} completion(s))")
                }
                EdgeKind::ThresholdCompare { bound, comparator } => println!(
                    "      -> {target} (if measured {} {bound})",
                    comparator.symbol()
                ),
            }
        }
    }

    debug!("dry-run complete (nothing scheduled)");
}
