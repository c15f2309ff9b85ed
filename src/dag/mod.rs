// src/dag/mod.rs

//! Task graph: registration, validation and resolution.
//!
//! - [`task`] holds task metadata and the [`Action`] enum.
//! - [`graph`] owns the registered tasks and expands a name into an
//!   execution order.
//! - [`registry`] builds the graph from configuration.

pub mod graph;
pub mod registry;
pub mod task;

pub use graph::TaskGraph;
pub use registry::build_task_graph;
pub use task::{Action, Task};
