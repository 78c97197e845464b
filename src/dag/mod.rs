// src/dag/mod.rs

//! Task graph model and readiness bookkeeping.
//!
//! - [`task`] holds the immutable `Task` / `Edge` definitions.
//! - [`registry`] is the static task table built at start-up.
//! - [`graph`] is the dependency graph engine that turns completions into
//!   ready instances.
//! - [`ready_queue`] holds at most one pending instance per task.
//! - [`instance`] and [`step`] are the small value types passed around.

pub mod graph;
pub mod instance;
pub mod ready_queue;
pub mod registry;
pub mod step;
pub mod task;

pub use graph::{DependencyGraph, EdgeKey};
pub use instance::TaskInstance;
pub use ready_queue::ReadyQueue;
pub use registry::TaskRegistry;
pub use step::CompletionStep;
pub use task::{Edge, EdgeKind, Task};
