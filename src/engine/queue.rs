// src/engine/queue.rs

use tracing::debug;

use super::TaskName;
use crate::types::RebuildPolicy;

/// Tasks waiting for the next rebuild.
///
/// Triggers arrive as batches (the tasks matched by one changed path). How
/// batches combine depends on the [`RebuildPolicy`]:
///
/// - `Queue`: the pending list is the ordered union of every batch recorded
///   since the last drain.
/// - `Latest`: each batch replaces whatever was pending.
#[derive(Debug)]
pub struct TriggerQueue {
    policy: RebuildPolicy,
    pending: Vec<TaskName>,
}

impl TriggerQueue {
    pub fn new(policy: RebuildPolicy) -> Self {
        Self {
            policy,
            pending: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn policy(&self) -> RebuildPolicy {
        self.policy
    }

    /// Currently pending tasks, in order.
    pub fn pending(&self) -> &[TaskName] {
        &self.pending
    }

    /// Record the tasks triggered by one change.
    pub fn record_batch(&mut self, tasks: &[TaskName]) {
        if tasks.is_empty() {
            return;
        }

        match self.policy {
            RebuildPolicy::Queue => {
                for task in tasks {
                    if !self.pending.contains(task) {
                        self.pending.push(task.clone());
                    }
                }
                debug!(pending = ?self.pending, "merged trigger batch (queue mode)");
            }
            RebuildPolicy::Latest => {
                self.pending.clear();
                for task in tasks {
                    if !self.pending.contains(task) {
                        self.pending.push(task.clone());
                    }
                }
                debug!(pending = ?self.pending, "replaced pending triggers (latest mode)");
            }
        }
    }

    /// Take everything pending, leaving the queue empty.
    pub fn drain_pending(&mut self) -> Vec<TaskName> {
        let tasks = std::mem::take(&mut self.pending);
        debug!(drained = tasks.len(), "drained pending triggers");
        tasks
    }
}
