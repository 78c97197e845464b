// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::Voltage;

/// Command-line arguments for `voltsched`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "voltsched",
    version,
    about = "Energy-aware task scheduler for battery-less, energy-harvesting devices.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the application config (TOML).
    #[arg(long, value_name = "PATH", default_value = "Voltsched.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `VOLTSCHED_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task table, but don't schedule anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Use a fixed supply voltage instead of the config's `[supply]` section.
    #[arg(long, value_name = "VOLTAGE")]
    pub voltage: Option<Voltage>,

    /// Stop after this many dispatches.
    #[arg(long, value_name = "N")]
    pub max_steps: Option<u64>,

    /// Stop after this many consecutive stalls (permanent brownout guard).
    #[arg(long, value_name = "N")]
    pub max_stalls: Option<u32>,

    /// Exit as soon as nothing is ready and no rearm timer is pending.
    #[arg(long)]
    pub exit_when_idle: bool,

    /// Run simulated bodies instantly instead of sleeping `execution_time`.
    #[arg(long)]
    pub fast: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
