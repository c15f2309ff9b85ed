#![allow(dead_code)]

use sitepipe::config::{ConfigFile, RawConfigFile, TaskConfig, WatchRuleConfig};
use sitepipe::dag::{Action, Task, TaskGraph};
use sitepipe::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_task(mut self, name: &str, cmd: &str, after: &[&str]) -> Self {
        self.config.task.insert(
            name.to_string(),
            TaskConfig {
                cmd: cmd.to_string(),
                after: after.iter().map(|s| s.to_string()).collect(),
                description: None,
            },
        );
        self
    }

    pub fn with_watch_rule(mut self, patterns: &[&str], tasks: &[&str]) -> Self {
        self.config.watch.push(WatchRuleConfig {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn without_watch_rules(mut self) -> Self {
        self.config.watch.clear();
        self
    }

    pub fn with_output(mut self, output: &str) -> Self {
        self.config.site.output = output.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.serve.port = port;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for hand-made task graphs.
///
/// Tasks added with [`TaskGraphBuilder::task`] get a dummy command so the
/// runner treats them as real work; [`TaskGraphBuilder::group`] adds
/// action-less grouping nodes.
#[derive(Default)]
pub struct TaskGraphBuilder {
    tasks: Vec<Task>,
}

impl TaskGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, name: &str, after: &[&str]) -> Self {
        self.tasks.push(
            Task::new(name)
                .after(after.iter().copied())
                .action(Action::Command {
                    cmd: format!("echo {name}"),
                }),
        );
        self
    }

    pub fn group(mut self, name: &str, after: &[&str]) -> Self {
        self.tasks.push(Task::new(name).after(after.iter().copied()));
        self
    }

    /// Register everything without validating.
    pub fn build_unchecked(self) -> Result<TaskGraph> {
        let mut graph = TaskGraph::new();
        for task in self.tasks {
            graph.register(task)?;
        }
        Ok(graph)
    }

    /// Register and validate.
    pub fn build(self) -> Result<TaskGraph> {
        let graph = self.build_unchecked()?;
        graph.validate()?;
        Ok(graph)
    }
}
