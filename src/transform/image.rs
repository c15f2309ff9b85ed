// src/transform/image.rs

//! Image optimization.
//!
//! Without an optimizer configured, images are copied as-is so the output
//! tree is still complete.

use std::fs;

use tracing::debug;

use super::tool::{describe_failure, ExternalTool};
use super::{write_output, StepContext, TransformResult, TransformStep};
use crate::matcher::FileSet;

#[derive(Debug, Clone)]
pub struct ImageOptimizer {
    pub optimizer: Option<ExternalTool>,
    pub progressive: bool,
    pub interlaced: bool,
}

impl ImageOptimizer {
    pub fn new(progressive: bool, interlaced: bool) -> Self {
        Self {
            optimizer: None,
            progressive,
            interlaced,
        }
    }

    /// Attach an optimizer; it sees the flags as `SITEPIPE_PROGRESSIVE` and
    /// `SITEPIPE_INTERLACED` (`1` or `0`).
    pub fn with_tool(mut self, optimizer: Option<ExternalTool>) -> Self {
        let flag = |b: bool| if b { "1" } else { "0" };
        self.optimizer = optimizer.map(|tool| {
            tool.with_env("SITEPIPE_PROGRESSIVE", flag(self.progressive))
                .with_env("SITEPIPE_INTERLACED", flag(self.interlaced))
        });
        self
    }

    fn optimize(&self, original: Vec<u8>, ctx: &StepContext) -> Result<Vec<u8>, String> {
        let Some(tool) = &self.optimizer else {
            return Ok(original);
        };
        let optimized = tool
            .pipe(&original, &ctx.root)
            .map_err(|e| describe_failure(&e))?;

        // Optimizers occasionally grow already-compressed files.
        if optimized.is_empty() || optimized.len() >= original.len() {
            Ok(original)
        } else {
            Ok(optimized)
        }
    }
}

impl Default for ImageOptimizer {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl TransformStep for ImageOptimizer {
    fn name(&self) -> &'static str {
        "minify-images"
    }

    fn apply(&self, input: &FileSet, ctx: &StepContext) -> TransformResult {
        let mut result = TransformResult::default();

        for path in input {
            let out_path = ctx.output_path(path);
            let outcome = fs::read(path)
                .map_err(|e| format!("reading input: {e}"))
                .and_then(|bytes| {
                    let before = bytes.len();
                    self.optimize(bytes, ctx).map(|out| (before, out))
                })
                .and_then(|(before, out)| {
                    write_output(&out_path, &out)
                        .map(|()| (before, out.len()))
                        .map_err(|e| format!("writing output: {e}"))
                });

            match outcome {
                Ok((before, after)) => {
                    debug!(
                        path = %path.display(),
                        before,
                        after,
                        "optimized image"
                    );
                    result.written.push(out_path);
                }
                Err(msg) => result.fail(path, msg),
            }
        }

        result
    }
}
