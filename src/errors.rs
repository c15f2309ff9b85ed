// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::transform::TransformFailure;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid glob pattern '{pattern}': {message}")]
    MatchError { pattern: String, message: String },

    #[error("{step} failed for {} file(s): {}", failures.len(), summarize_failures(failures))]
    TransformError {
        step: String,
        failures: Vec<TransformFailure>,
    },

    #[error("Command `{cmd}` exited with code {code}")]
    SubprocessError {
        cmd: String,
        code: i32,
        /// Captured stdout/stderr of the failed process.
        output: String,
    },

    #[error("Cycle detected in task graph: {}", chain.join(" -> "))]
    CycleError { chain: Vec<String> },

    #[error("{}", unknown_task_message(name, required_by.as_deref()))]
    UnknownTask {
        name: String,
        required_by: Option<String>,
    },

    #[error("Task '{0}' is registered more than once")]
    DuplicateTask(String),

    #[error("Cannot watch {path:?}: {message}")]
    WatchError { path: PathBuf, message: String },

    #[error("Output lock {path:?} is held by another sitepipe process{}", holder.map(|pid| format!(" (PID {pid})")).unwrap_or_default())]
    LockError { path: PathBuf, holder: Option<u32> },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn summarize_failures(failures: &[TransformFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.path.display(), f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn unknown_task_message(name: &str, required_by: Option<&str>) -> String {
    match required_by {
        Some(parent) => format!("Unknown task '{name}' (required by '{parent}')"),
        None => format!("Unknown task '{name}'"),
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
