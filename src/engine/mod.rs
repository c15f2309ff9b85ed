// src/engine/mod.rs

//! Orchestration engine for sitepipe.
//!
//! This module ties together:
//! - the [`Runner`] that executes resolved task plans for the CLI
//! - the trigger queue (what happens to changes that arrive mid-rebuild)
//! - the watch loop that reacts to file changes and shutdown signals
//!
//! The pure watch state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::path::PathBuf;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Events flowing into the watch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A file under the project root was created, modified or removed.
    PathChanged(PathBuf),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod queue;
pub mod runner;
pub mod runtime;

pub use core::{CoreStep, WatchCore};
pub use queue::TriggerQueue;
pub use runner::{RunReport, Runner};
pub use runtime::WatchLoop;
