// src/engine/core.rs

//! Pure core of the watch loop.
//!
//! [`WatchCore`] consumes [`RuntimeEvent`]s and decides which tasks the next
//! rebuild should run. It has no channels and no Tokio types; the async
//! shell (`engine::runtime::WatchLoop`) feeds it events and executes what it
//! hands back.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, TaskName};
use crate::paths::{relative_slash, to_slash};
use crate::types::RebuildPolicy;
use crate::watch::{tasks_for_path, WatchRule};

/// Result of feeding one event to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreStep {
    /// The event added tasks to the pending rebuild.
    pub triggered: bool,
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct WatchCore {
    root: PathBuf,
    /// Output directory relative to `root`, `/`-separated.
    output: String,
    rules: Vec<WatchRule>,
    queue: TriggerQueue,
}

impl WatchCore {
    pub fn new(root: PathBuf, output: PathBuf, rules: Vec<WatchRule>, policy: RebuildPolicy) -> Self {
        let output = to_slash(&output)
            .trim_start_matches("./")
            .trim_end_matches('/')
            .to_string();
        Self {
            root,
            output,
            rules,
            queue: TriggerQueue::new(policy),
        }
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Tasks the next rebuild would run.
    pub fn pending(&self) -> &[TaskName] {
        self.queue.pending()
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::PathChanged(path) => CoreStep {
                triggered: self.handle_path(&path),
                keep_running: true,
            },
            RuntimeEvent::ShutdownRequested => CoreStep {
                triggered: false,
                keep_running: false,
            },
        }
    }

    /// Hand the pending tasks to the caller for one rebuild.
    pub fn take_batch(&mut self) -> Vec<TaskName> {
        self.queue.drain_pending()
    }

    fn handle_path(&mut self, path: &Path) -> bool {
        let rel = if path.is_absolute() {
            match relative_slash(&self.root, path) {
                Some(rel) => rel,
                None => {
                    trace!(path = %path.display(), "change outside project root");
                    return false;
                }
            }
        } else {
            to_slash(path)
        };

        if self.is_output(&rel) {
            trace!(path = %rel, "ignoring change inside output directory");
            return false;
        }

        let tasks = tasks_for_path(&self.rules, &rel);
        if tasks.is_empty() {
            trace!(path = %rel, "no watch rule matched");
            return false;
        }

        debug!(path = %rel, ?tasks, "change triggered tasks");
        self.queue.record_batch(&tasks);
        true
    }

    fn is_output(&self, rel: &str) -> bool {
        rel == self.output
            || rel
                .strip_prefix(self.output.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}
