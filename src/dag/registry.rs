// src/dag/registry.rs

//! The built-in task set, plus user tasks from `[task.<name>]`.

use std::path::{Path, PathBuf};

use crate::config::model::ConfigFile;
use crate::dag::graph::TaskGraph;
use crate::dag::task::{Action, Task};
use crate::errors::Result;
use crate::manifest::ManifestSpec;
use crate::paths::to_slash;
use crate::transform::{
    CssProcessor, ExternalTool, HtmlMinifier, ImageOptimizer, ScriptBundler, StepKind,
    TransformSpec,
};

/// Steps shared by `build` and `deploy`, in execution order.
const BUILD_SEQUENCE: &[&str] = &[
    "cleanup-build",
    "scripts",
    "jekyll-build-for-deploy",
    "minify-html",
    "css",
    "generate-service-worker",
    "minify-images",
];

/// `deploy` additionally strips deploy-only entries from the manifest
/// before images are optimized, and publishes at the end.
const DEPLOY_SEQUENCE: &[&str] = &[
    "cleanup-build",
    "scripts",
    "jekyll-build-for-deploy",
    "minify-html",
    "css",
    "generate-service-worker",
    "cleanup-sw-deploy",
    "minify-images",
    "publish",
];

/// Build and validate the task graph for `cfg`.
pub fn build_task_graph(cfg: &ConfigFile) -> Result<TaskGraph> {
    let mut graph = TaskGraph::new();

    for task in builtin_tasks(cfg) {
        graph.register(task)?;
    }

    for (name, task_cfg) in cfg.task.iter() {
        let mut task = Task::new(name.clone())
            .after(task_cfg.after.iter().cloned())
            .action(Action::Command {
                cmd: task_cfg.cmd.clone(),
            });
        if let Some(desc) = &task_cfg.description {
            task = task.describe(desc.clone());
        }
        graph.register(task)?;
    }

    graph.validate()?;
    Ok(graph)
}

fn builtin_tasks(cfg: &ConfigFile) -> Vec<Task> {
    let tools = &cfg.tools;
    let output = cfg.site.output.clone();

    let scripts = ScriptBundler::new(cfg.scripts.bundle.clone()).with_tools(
        ExternalTool::from_config(tools.js_compiler.as_deref()),
        ExternalTool::from_config(tools.js_minifier.as_deref()),
    );
    let css = CssProcessor::new(cfg.css.browsers.clone()).with_tools(
        ExternalTool::from_config(tools.css_prefixer.as_deref()),
        ExternalTool::from_config(tools.css_minifier.as_deref()),
    );
    let html = HtmlMinifier::new(cfg.html.options)
        .with_tool(ExternalTool::from_config(tools.html_minifier.as_deref()));
    let images = ImageOptimizer::new(cfg.images.progressive, cfg.images.interlaced)
        .with_tool(ExternalTool::from_config(tools.image_optimizer.as_deref()));

    let site_generator = Action::Command {
        cmd: tools.site_generator.clone(),
    };

    vec![
        Task::new("cleanup-build")
            .action(Action::Clean {
                path: output.clone(),
            })
            .describe("Delete the output directory"),
        Task::new("scripts")
            .action(Action::Transform(TransformSpec {
                step: StepKind::Scripts(scripts),
                sources: cfg.scripts.sources.clone(),
                base: PathBuf::new(),
                dest: output.join(&cfg.scripts.dest),
            }))
            .describe("Concatenate, compile and minify scripts"),
        Task::new("css")
            .action(Action::Transform(TransformSpec {
                step: StepKind::Css(css),
                sources: cfg.css.sources.clone(),
                base: cfg.css.base.clone(),
                dest: output.join(&cfg.css.dest),
            }))
            .describe("Prefix and minify stylesheets"),
        Task::new("jekyll-build-for-deploy")
            .action(site_generator.clone())
            .describe("Generate the site"),
        Task::new("jekyll-build")
            .after(["scripts"])
            .action(site_generator)
            .describe("Bundle scripts, then generate the site"),
        Task::new("minify-html")
            .action(Action::Transform(TransformSpec {
                step: StepKind::Html(html),
                sources: under_output(&output, &cfg.html.sources),
                base: output.clone(),
                dest: output.clone(),
            }))
            .describe("Minify generated HTML"),
        Task::new("minify-images")
            .action(Action::Transform(TransformSpec {
                step: StepKind::Images(images),
                sources: cfg.images.sources.clone(),
                base: cfg.images.base.clone(),
                dest: output.join(&cfg.images.dest),
            }))
            .describe("Optimize images"),
        Task::new("generate-service-worker")
            .action(Action::GenerateManifest(ManifestSpec {
                output: output.clone(),
                file: cfg.manifest.file.clone(),
                include: cfg.manifest.include.clone(),
                cache_id: cfg.manifest.cache_id.clone(),
            }))
            .describe("Write the offline-caching service worker"),
        Task::new("cleanup-sw-deploy")
            .action(Action::PruneManifest {
                file: output.join(&cfg.manifest.file),
                suffixes: cfg.manifest.deploy_exclude.clone(),
                cache_id: cfg.manifest.cache_id.clone(),
            })
            .describe("Remove deploy-excluded pages from the service worker"),
        Task::new("publish")
            .action(Action::Command {
                cmd: tools.publish.clone(),
            })
            .describe("Publish the output directory"),
        Task::new("build")
            .after(BUILD_SEQUENCE.iter().copied())
            .describe("Full production build"),
        Task::new("deploy")
            .after(DEPLOY_SEQUENCE.iter().copied())
            .describe("Full build, then publish"),
        Task::new("serve")
            .after(["jekyll-build", "css"])
            .action(Action::Serve)
            .describe("Preview server with live reload"),
    ]
}

/// Re-root output-relative globs at the project root, keeping negations.
fn under_output(output: &Path, patterns: &[String]) -> Vec<String> {
    let prefix = to_slash(output);
    let prefix = prefix.trim_end_matches('/');
    patterns
        .iter()
        .map(|pattern| match pattern.strip_prefix('!') {
            Some(glob) => format!("!{prefix}/{}", glob.trim_start_matches("./")),
            None => format!("{prefix}/{}", pattern.trim_start_matches("./")),
        })
        .collect()
}
