// src/dag/graph.rs

use std::collections::{BTreeMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::task::Task;
use crate::errors::{PipelineError, Result};

/// All registered tasks, keyed by name.
///
/// Built once at start-up and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: BTreeMap<String, Task>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Names are unique; registering one twice is an error.
    pub fn register(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.name) {
            return Err(PipelineError::DuplicateTask(task.name));
        }
        debug!(task = %task.name, prerequisites = ?task.prerequisites, "registered task");
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Tasks in name order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Check the whole graph: every prerequisite must exist and the relation
    /// must be acyclic.
    pub fn validate(&self) -> Result<()> {
        for task in self.tasks.values() {
            for dep in &task.prerequisites {
                if !self.tasks.contains_key(dep) {
                    return Err(PipelineError::UnknownTask {
                        name: dep.clone(),
                        required_by: Some(task.name.clone()),
                    });
                }
            }
        }

        // Edge direction: prerequisite -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.tasks.keys() {
            graph.add_node(name.as_str());
        }
        for task in self.tasks.values() {
            for dep in &task.prerequisites {
                graph.add_edge(dep.as_str(), task.name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => {
                // Re-resolve from the offending node to report the full chain.
                let node = cycle.node_id();
                match self.resolve(node) {
                    Err(err @ PipelineError::CycleError { .. }) => Err(err),
                    _ => Err(PipelineError::CycleError {
                        chain: vec![node.to_string(), node.to_string()],
                    }),
                }
            }
        }
    }

    /// Expand `name` into its execution order: prerequisites depth-first in
    /// declaration order, then the task itself.
    ///
    /// Each task appears at most once per resolution, so shared prerequisites
    /// (diamonds) run once.
    pub fn resolve(&self, name: &str) -> Result<Vec<&Task>> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut stack = Vec::new();
        self.visit(name, None, &mut stack, &mut done, &mut order)?;
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        required_by: Option<&str>,
        stack: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
        order: &mut Vec<&'a Task>,
    ) -> Result<()> {
        let Some(task) = self.tasks.get(name) else {
            return Err(PipelineError::UnknownTask {
                name: name.to_string(),
                required_by: required_by.map(str::to_string),
            });
        };
        let name = task.name.as_str();

        if done.contains(name) {
            return Ok(());
        }
        if let Some(pos) = stack.iter().position(|n| *n == name) {
            let mut chain: Vec<String> = stack[pos..].iter().map(|n| n.to_string()).collect();
            chain.push(name.to_string());
            return Err(PipelineError::CycleError { chain });
        }

        stack.push(name);
        for dep in &task.prerequisites {
            self.visit(dep, Some(name), stack, done, order)?;
        }
        stack.pop();

        done.insert(name);
        order.push(task);
        Ok(())
    }
}
