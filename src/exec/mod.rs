// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] defines the `TaskExecutor` trait and `ConfiguredExecutor`.
//! - [`task_runner`] runs task bodies as shell commands via
//!   `tokio::process::Command`.
//! - [`simulated`] stands in for hardware bodies (camera, inference, radio,
//!   LED) using the configured execution times and measurements.

pub mod backend;
pub mod simulated;
pub mod task_runner;

pub use backend::{ConfiguredExecutor, TaskExecutor};
pub use simulated::{SimulatedBody, SimulatedExecutor};
pub use task_runner::{CommandBody, CommandExecutor};
