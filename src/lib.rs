// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod lock;
pub mod logging;
pub mod manifest;
pub mod matcher;
pub mod paths;
pub mod serve;
pub mod transform;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate, load_optional};
use crate::config::model::ConfigFile;
use crate::dag::{build_task_graph, Task, TaskGraph};
use crate::engine::Runner;
use crate::exec::{PipelineContext, RealExecutor};
use crate::lock::OutputLock;
use crate::watch::compile_rules;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and project root discovery
/// - the task graph
/// - `--list` / `--dry-run` output
/// - the project lock
/// - the runner with the real executor
pub async fn run(args: CliArgs) -> Result<()> {
    let (cfg, config_path) = load_config(args.config.as_deref())?;
    let root = project_root(args.root.as_deref(), config_path.as_deref())?;
    debug!(root = %root.display(), "resolved project root");

    let graph = Arc::new(build_task_graph(&cfg).context("building task graph")?);

    if args.list {
        print_task_list(&graph);
        return Ok(());
    }

    let plan = graph.resolve(&args.task)?;
    if args.dry_run {
        print_dry_run(&args.task, &root, &plan);
        return Ok(());
    }

    let rules = compile_rules(&cfg.watch, &graph)?;
    let mut ctx = PipelineContext::from_config(root.clone(), &cfg, rules);
    if let Some(port) = args.port {
        if port == 0 {
            bail!("--port must be >= 1");
        }
        ctx.port = port;
    }

    let _lock = OutputLock::acquire(&root)?;

    let executor = RealExecutor::new(Arc::new(ctx), Arc::clone(&graph));
    let mut runner = Runner::new(graph, executor);
    let report = runner
        .run(&args.task)
        .await
        .with_context(|| format!("task '{}' failed", args.task))?;

    info!(
        task = %args.task,
        executed = report.executed.len(),
        "all tasks finished"
    );
    Ok(())
}

/// Explicit config paths must exist; the implicit `Sitepipe.toml` is optional.
///
/// Returns the path of the file that was actually read, if any.
fn load_config(explicit: Option<&Path>) -> Result<(ConfigFile, Option<PathBuf>)> {
    match explicit {
        Some(path) => {
            let cfg = load_and_validate(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            Ok((cfg, Some(path.to_path_buf())))
        }
        None => {
            let path = default_config_path();
            let found = path.is_file().then(|| path.clone());
            let cfg = load_optional(&path)
                .with_context(|| format!("loading config {}", path.display()))?;
            Ok((cfg, found))
        }
    }
}

/// `--root`, else the config file's directory, else the working directory.
fn project_root(explicit: Option<&Path>, config_path: Option<&Path>) -> Result<PathBuf> {
    let root = match (explicit, config_path.and_then(Path::parent)) {
        (Some(root), _) => root.to_path_buf(),
        (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().context("reading current directory")?,
    };

    if !root.is_dir() {
        bail!("project root {} is not a directory", root.display());
    }
    Ok(paths::absolute(&root))
}

fn print_task_list(graph: &TaskGraph) {
    println!("tasks ({}):", graph.len());
    for task in graph.tasks() {
        let kind = task.action.as_ref().map_or("group", |a| a.kind());
        match &task.description {
            Some(desc) => println!("  {:<26} {:<14} {desc}", task.name, kind),
            None => println!("  {:<26} {kind}", task.name),
        }
    }
}

fn print_dry_run(name: &str, root: &Path, plan: &[&Task]) {
    println!("sitepipe dry-run: {name}");
    println!("  root: {}", root.display());
    println!();
    for (idx, task) in plan.iter().enumerate() {
        match &task.action {
            Some(action) => println!("  {:>2}. {:<26} {action}", idx + 1, task.name),
            None => println!(
                "  {:>2}. {:<26} (group: {})",
                idx + 1,
                task.name,
                task.prerequisites.join(", ")
            ),
        }
    }
    debug!("dry-run complete (no execution)");
}
