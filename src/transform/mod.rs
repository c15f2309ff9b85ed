// src/transform/mod.rs

//! Transform steps: `files -> files` conversions written to a destination.
//!
//! Each concrete step wraps one kind of asset processing:
//!
//! - [`html`] minifies generated HTML pages in place.
//! - [`script`] concatenates, compiles and minifies scripts into a bundle.
//! - [`css`] vendor-prefixes and minifies stylesheets.
//! - [`image`] runs images through an optimizer.
//!
//! The heavy lifting is delegated to external tools (see [`tool`]) when
//! configured. Every input file either produces an output or contributes
//! exactly one [`TransformFailure`]; one bad file never stops the others.

pub mod css;
pub mod html;
pub mod image;
pub mod script;
pub mod tool;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::matcher::{match_files, FileSet};

pub use css::CssProcessor;
pub use html::{HtmlMinifier, HtmlMinifyOptions};
pub use image::ImageOptimizer;
pub use script::ScriptBundler;
pub use tool::ExternalTool;

/// One input file that could not be transformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformFailure {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for TransformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Outcome of applying a step to a [`FileSet`].
#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub written: FileSet,
    pub errors: Vec<TransformFailure>,
}

impl TransformResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fail(&mut self, path: &Path, message: impl Into<String>) {
        let message = message.into();
        debug!(path = %path.display(), %message, "transform failed for file");
        self.errors.push(TransformFailure {
            path: path.to_path_buf(),
            message,
        });
    }

    /// Turn collected failures into a single batch error for `step`.
    pub fn into_result(self, step: &str) -> Result<FileSet> {
        if self.errors.is_empty() {
            Ok(self.written)
        } else {
            Err(PipelineError::TransformError {
                step: step.to_string(),
                failures: self.errors,
            })
        }
    }
}

/// Where a step reads from and writes to.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Project root; external tools run here.
    pub root: PathBuf,
    /// Inputs are mirrored relative to this directory.
    pub base: PathBuf,
    /// Destination directory.
    pub dest: PathBuf,
}

impl StepContext {
    /// Destination path for `input`, mirroring its position under `base`.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match input.strip_prefix(&self.base) {
            Ok(rel) => self.dest.join(rel),
            Err(_) => self
                .dest
                .join(input.file_name().unwrap_or(input.as_os_str())),
        }
    }
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_output(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// A single asset-processing capability.
pub trait TransformStep: Send + Sync + fmt::Debug {
    /// Human-readable step name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Transform every file in `input`, writing results under `ctx.dest`.
    fn apply(&self, input: &FileSet, ctx: &StepContext) -> TransformResult;
}

/// The concrete steps a task can run.
#[derive(Debug, Clone)]
pub enum StepKind {
    Html(HtmlMinifier),
    Scripts(ScriptBundler),
    Css(CssProcessor),
    Images(ImageOptimizer),
}

impl StepKind {
    pub fn step(&self) -> &dyn TransformStep {
        match self {
            StepKind::Html(s) => s,
            StepKind::Scripts(s) => s,
            StepKind::Css(s) => s,
            StepKind::Images(s) => s,
        }
    }
}

/// A step bound to its source globs and directories (all relative to the
/// project root).
#[derive(Debug, Clone)]
pub struct TransformSpec {
    pub step: StepKind,
    pub sources: Vec<String>,
    /// Inputs are mirrored relative to this directory. The script bundler
    /// writes one named file and ignores it.
    pub base: PathBuf,
    pub dest: PathBuf,
}

impl TransformSpec {
    /// Resolve the sources under `root` and apply the step.
    ///
    /// Glob and destination-directory problems are returned as errors; per
    /// file problems are collected in the [`TransformResult`].
    pub fn run(&self, root: &Path) -> Result<TransformResult> {
        let step = self.step.step();
        let input = match_files(&self.sources, root)?;

        let ctx = StepContext {
            root: root.to_path_buf(),
            base: crate::paths::absolute(&root.join(&self.base)),
            dest: root.join(&self.dest),
        };
        fs::create_dir_all(&ctx.dest)?;

        info!(
            step = step.name(),
            inputs = input.len(),
            dest = %self.dest.display(),
            "applying transform"
        );

        let result = step.apply(&input, &ctx);
        debug!(
            step = step.name(),
            written = result.written.len(),
            failed = result.errors.len(),
            "transform finished"
        );
        Ok(result)
    }
}
