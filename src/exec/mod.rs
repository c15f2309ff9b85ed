// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`command`] runs shell commands with `tokio::process` and reports
//!   failures as [`crate::errors::PipelineError::SubprocessError`].
//! - [`backend`] provides the `ExecutorBackend` trait used by the runner and
//!   the production `RealExecutor`, which tests replace with a fake.

pub mod backend;
pub mod command;

pub use backend::{ExecutorBackend, PipelineContext, RealExecutor};
pub use command::{run_command, CommandOutput};
