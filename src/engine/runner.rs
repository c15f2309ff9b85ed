// src/engine/runner.rs

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::dag::{Task, TaskGraph};
use crate::engine::TaskName;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

/// What one invocation ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Tasks whose action was performed, in order.
    pub executed: Vec<TaskName>,
    /// Grouping nodes passed through.
    pub grouped: Vec<TaskName>,
}

/// Runs resolved plans one task at a time.
///
/// Every action is awaited before the next starts; the first failure stops
/// the plan. Nothing is memoized between calls, so running `build` twice
/// runs its prerequisites twice.
pub struct Runner<E: ExecutorBackend> {
    graph: Arc<TaskGraph>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runner<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("tasks", &self.graph.len())
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runner<E> {
    pub fn new(graph: Arc<TaskGraph>, executor: E) -> Self {
        Self { graph, executor }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Resolve and run `name`.
    pub async fn run(&mut self, name: &str) -> Result<RunReport> {
        self.run_many(&[name]).await
    }

    /// Resolve several tasks into one plan (shared prerequisites once) and
    /// run it.
    pub async fn run_many<S: AsRef<str>>(&mut self, names: &[S]) -> Result<RunReport> {
        let graph = Arc::clone(&self.graph);
        let mut plan: Vec<&Task> = Vec::new();
        for name in names {
            for task in graph.resolve(name.as_ref())? {
                if !plan.iter().any(|t| t.name == task.name) {
                    plan.push(task);
                }
            }
        }

        debug!(
            plan = ?plan.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "resolved execution plan"
        );

        let mut report = RunReport::default();
        for task in plan {
            if task.is_group() {
                debug!(task = %task.name, "grouping task; nothing to do");
                report.grouped.push(task.name.clone());
                continue;
            }

            let started = Instant::now();
            info!(task = %task.name, "starting task");
            if let Err(err) = self.executor.execute(task).await {
                error!(task = %task.name, error = %err, "task failed");
                return Err(err);
            }
            info!(
                task = %task.name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "finished task"
            );
            report.executed.push(task.name.clone());
        }

        Ok(report)
    }
}
