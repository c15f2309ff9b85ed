// src/watch/patterns.rs

use std::fmt;

use globset::GlobSet;

use crate::config::model::WatchRuleConfig;
use crate::dag::{Action, TaskGraph};
use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};
use crate::matcher::compile_globset;

/// Compiled `[[watch]]` rule: paths matching any pattern trigger `tasks`.
///
/// Patterns are relative to the project root; the watcher passes relative
/// `/`-separated paths (e.g. `"_posts/2016-01-01-hello.md"`).
#[derive(Clone)]
pub struct WatchRule {
    patterns: Vec<String>,
    tasks: Vec<TaskName>,
    set: GlobSet,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("patterns", &self.patterns)
            .field("tasks", &self.tasks)
            .finish()
    }
}

impl WatchRule {
    pub fn new<P, T>(patterns: P, tasks: T) -> Result<Self>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<TaskName>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let tasks: Vec<TaskName> = tasks.into_iter().map(Into::into).collect();
        let set = compile_globset(&patterns)?;
        Ok(Self {
            patterns,
            tasks,
            set,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// Tasks triggered by `rel_path`: rule order, then task order, without
/// duplicates.
pub fn tasks_for_path(rules: &[WatchRule], rel_path: &str) -> Vec<TaskName> {
    let mut tasks: Vec<TaskName> = Vec::new();
    for rule in rules.iter().filter(|r| r.matches(rel_path)) {
        for task in &rule.tasks {
            if !tasks.contains(task) {
                tasks.push(task.clone());
            }
        }
    }
    tasks
}

/// Compile configured rules and check them against the task graph.
///
/// Every referenced task must exist, and none may pull in `serve` (a rebuild
/// would start a second preview session).
pub fn compile_rules(configs: &[WatchRuleConfig], graph: &TaskGraph) -> Result<Vec<WatchRule>> {
    let mut rules = Vec::with_capacity(configs.len());

    for cfg in configs {
        for task in &cfg.tasks {
            let plan = graph.resolve(task).map_err(|err| match err {
                PipelineError::UnknownTask { name, .. } => PipelineError::ConfigError(format!(
                    "[[watch]] rule {:?} references unknown task '{name}'",
                    cfg.patterns
                )),
                other => other,
            })?;
            if plan.iter().any(|t| matches!(t.action, Some(Action::Serve))) {
                return Err(PipelineError::ConfigError(format!(
                    "[[watch]] rule {:?} cannot trigger '{task}' because it runs the preview server",
                    cfg.patterns
                )));
            }
        }
        rules.push(WatchRule::new(cfg.patterns.iter().cloned(), cfg.tasks.iter().cloned())?);
    }

    Ok(rules)
}
