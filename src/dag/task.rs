// src/dag/task.rs

//! Task metadata and the actions a task can perform.

use std::fmt;
use std::path::PathBuf;

use crate::manifest::ManifestSpec;
use crate::transform::TransformSpec;

/// What a task does when it runs. Tasks without an action only group their
/// prerequisites.
#[derive(Debug, Clone)]
pub enum Action {
    /// Remove a directory (relative to the project root) if present.
    Clean { path: PathBuf },
    /// Run a shell command in the project root.
    Command { cmd: String },
    Transform(TransformSpec),
    GenerateManifest(ManifestSpec),
    /// Drop entries ending with any of `suffixes` from an existing manifest.
    PruneManifest {
        file: PathBuf,
        suffixes: Vec<String>,
        cache_id: String,
    },
    /// Preview server plus watch loop; runs until interrupted.
    Serve,
}

impl Action {
    /// Short label used by `--list` and `--dry-run`.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Clean { .. } => "clean",
            Action::Command { .. } => "command",
            Action::Transform(spec) => spec.step.step().name(),
            Action::GenerateManifest(_) => "manifest",
            Action::PruneManifest { .. } => "manifest-prune",
            Action::Serve => "serve",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Clean { path } => write!(f, "remove {}", path.display()),
            Action::Command { cmd } => write!(f, "run `{cmd}`"),
            Action::Transform(spec) => write!(
                f,
                "{} {} -> {}",
                spec.step.step().name(),
                spec.sources.join(", "),
                spec.dest.display()
            ),
            Action::GenerateManifest(spec) => write!(
                f,
                "write {} from {}",
                spec.output.join(&spec.file).display(),
                spec.include.join(", ")
            ),
            Action::PruneManifest { file, suffixes, .. } => write!(
                f,
                "prune {} from {}",
                suffixes.join(", "),
                file.display()
            ),
            Action::Serve => write!(f, "preview server + watch"),
        }
    }
}

/// A named unit of work.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    /// Run, in order, before this task.
    pub prerequisites: Vec<String>,
    pub action: Option<Action>,
    pub description: Option<String>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prerequisites: Vec::new(),
            action: None,
            description: None,
        }
    }

    pub fn after<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Grouping nodes have no action of their own.
    pub fn is_group(&self) -> bool {
        self.action.is_none()
    }
}
