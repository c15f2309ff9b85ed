// src/transform/css.rs

//! Stylesheet processing: vendor prefixing, then minification.

use std::fs;

use tracing::debug;

use super::tool::{describe_failure, ExternalTool};
use super::{write_output, StepContext, TransformResult, TransformStep};
use crate::matcher::FileSet;

/// Browser targets handed to the prefixer when none are configured.
pub const DEFAULT_BROWSERS: &[&str] = &[
    "ie >= 10",
    "ie_mob >= 10",
    "ff >= 30",
    "chrome >= 34",
    "safari >= 7",
    "opera >= 23",
    "ios >= 7",
    "android >= 4.4",
    "bb >= 10",
];

#[derive(Debug, Clone)]
pub struct CssProcessor {
    pub browsers: Vec<String>,
    pub prefixer: Option<ExternalTool>,
    pub minifier: Option<ExternalTool>,
}

impl CssProcessor {
    pub fn new(browsers: Vec<String>) -> Self {
        Self {
            browsers,
            prefixer: None,
            minifier: None,
        }
    }

    /// Attach external tools. The prefixer sees the browser list as
    /// `BROWSERSLIST`.
    pub fn with_tools(mut self, prefixer: Option<ExternalTool>, minifier: Option<ExternalTool>) -> Self {
        let browsers = self.browsers.join(", ");
        self.prefixer = prefixer.map(|p| p.with_env("BROWSERSLIST", browsers));
        self.minifier = minifier;
        self
    }

    fn process(&self, src: Vec<u8>, ctx: &StepContext) -> Result<Vec<u8>, String> {
        let prefixed = match &self.prefixer {
            Some(prefixer) => prefixer
                .pipe(&src, &ctx.root)
                .map_err(|e| format!("prefixing: {}", describe_failure(&e)))?,
            None => src,
        };

        match &self.minifier {
            Some(minifier) => minifier
                .pipe(&prefixed, &ctx.root)
                .map_err(|e| format!("minifying: {}", describe_failure(&e))),
            None => Ok(compact_css(&String::from_utf8_lossy(&prefixed)).into_bytes()),
        }
    }
}

impl Default for CssProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_BROWSERS.iter().map(|b| b.to_string()).collect())
    }
}

impl TransformStep for CssProcessor {
    fn name(&self) -> &'static str {
        "css"
    }

    fn apply(&self, input: &FileSet, ctx: &StepContext) -> TransformResult {
        let mut result = TransformResult::default();

        for path in input {
            let out_path = ctx.output_path(path);
            let processed = fs::read(path)
                .map_err(|e| format!("reading input: {e}"))
                .and_then(|src| self.process(src, ctx))
                .and_then(|css| {
                    write_output(&out_path, &css).map_err(|e| format!("writing output: {e}"))
                });

            match processed {
                Ok(()) => {
                    debug!(from = %path.display(), to = %out_path.display(), "processed stylesheet");
                    result.written.push(out_path);
                }
                Err(msg) => result.fail(path, msg),
            }
        }

        result
    }
}

/// Built-in CSS compaction: drops comments and insignificant whitespace,
/// keeps string contents verbatim.
pub fn compact_css(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut pending_space = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i += 2;
            pending_space = true;
            continue;
        }

        if c.is_whitespace() {
            pending_space = true;
            i += 1;
            continue;
        }

        if pending_space {
            pending_space = false;
            let prev = out.chars().last();
            let dropped = prev.is_none_or(|p| "{};,>:(".contains(p)) || "{};,>)".contains(c);
            if !dropped {
                out.push(' ');
            }
        }

        if c == '"' || c == '\'' {
            out.push(c);
            i += 1;
            while i < chars.len() {
                let s = chars[i];
                out.push(s);
                i += 1;
                if s == '\\' {
                    if let Some(&escaped) = chars.get(i) {
                        out.push(escaped);
                        i += 1;
                    }
                } else if s == c {
                    break;
                }
            }
            continue;
        }

        if c == '}' && out.ends_with(';') {
            out.pop();
        }
        out.push(c);
        i += 1;
    }

    out
}
