// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The [`Runner`](crate::engine::Runner) talks to an `ExecutorBackend`
//! instead of performing actions itself. Production code uses
//! [`RealExecutor`]; tests provide a fake that records which tasks ran.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::dag::{Action, Task, TaskGraph};
use crate::engine::{Runner, RuntimeEvent, WatchCore, WatchLoop};
use crate::errors::{PipelineError, Result};
use crate::manifest::prune_manifest_file;
use crate::serve::PreviewServer;
use crate::types::RebuildPolicy;
use crate::watch::{spawn_watcher, WatchRule};

use super::command::run_command;

/// Trait abstracting how a single task's action is performed.
pub trait ExecutorBackend: Send {
    /// Perform `task`'s action. Only called for tasks that have one.
    fn execute<'a>(
        &'a mut self,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Everything actions need to know about the project.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Absolute project root; every relative path is resolved against it.
    pub root: PathBuf,
    /// Output directory relative to `root`.
    pub output: PathBuf,
    pub port: u16,
    pub watch_rules: Vec<WatchRule>,
    pub debounce: Duration,
    pub rebuild_policy: RebuildPolicy,
}

impl PipelineContext {
    pub fn from_config(root: PathBuf, cfg: &ConfigFile, watch_rules: Vec<WatchRule>) -> Self {
        Self {
            root,
            output: cfg.site.output.clone(),
            port: cfg.serve.port,
            watch_rules,
            debounce: Duration::from_millis(cfg.serve.debounce_ms),
            rebuild_policy: cfg.serve.rebuild_policy,
        }
    }

    pub fn output_root(&self) -> PathBuf {
        self.root.join(&self.output)
    }
}

/// Executor that performs real filesystem work and spawns real processes.
#[derive(Debug, Clone)]
pub struct RealExecutor {
    ctx: Arc<PipelineContext>,
    graph: Arc<TaskGraph>,
}

impl RealExecutor {
    pub fn new(ctx: Arc<PipelineContext>, graph: Arc<TaskGraph>) -> Self {
        Self { ctx, graph }
    }

    async fn perform(&self, task: &Task) -> Result<()> {
        let Some(action) = &task.action else {
            return Ok(());
        };
        let root = self.ctx.root.clone();

        match action {
            Action::Clean { path } => clean(&root.join(path)).await,
            Action::Command { cmd } => run_command(&task.name, cmd, &root).await.map(|_| ()),
            Action::Transform(spec) => {
                let spec = spec.clone();
                let step = spec.step.step().name();
                let result = blocking(move || spec.run(&root)).await?;
                let written = result.into_result(step)?;
                info!(task = %task.name, written = written.len(), "transform complete");
                Ok(())
            }
            Action::GenerateManifest(spec) => {
                let spec = spec.clone();
                blocking(move || spec.run(&root)).await.map(|_| ())
            }
            Action::PruneManifest {
                file,
                suffixes,
                cache_id,
            } => {
                let path = root.join(file);
                let suffixes = suffixes.clone();
                let cache_id = cache_id.clone();
                blocking(move || prune_manifest_file(&path, &suffixes, &cache_id))
                    .await
                    .map(|_| ())
            }
            Action::Serve => self.serve().await,
        }
    }

    /// Preview server plus watch loop, until Ctrl-C.
    async fn serve(&self) -> Result<()> {
        let ctx = &self.ctx;

        let server = PreviewServer::bind(ctx.output_root(), ctx.port).await?;
        let reload = server.reload_handle();
        let server_task = tokio::spawn(server.run());

        let (tx, rx) = mpsc::unbounded_channel();
        let _watcher = spawn_watcher(&ctx.root, tx.clone())?;

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested);
        });

        let core = WatchCore::new(
            ctx.root.clone(),
            ctx.output.clone(),
            ctx.watch_rules.clone(),
            ctx.rebuild_policy,
        );
        let runner = Runner::new(Arc::clone(&self.graph), self.clone());
        let result = WatchLoop::new(core, rx, runner, ctx.debounce)
            .with_reload(reload)
            .run()
            .await;

        server_task.abort();
        result.map(|_| ())
    }
}

impl ExecutorBackend for RealExecutor {
    fn execute<'a>(
        &'a mut self,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.perform(task))
    }
}

async fn clean(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "removed directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "nothing to clean");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Run CPU/IO-heavy work off the async threads and wait for it.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::Other(e.into()))?
}
