// src/transform/script.rs

//! Script bundling: concatenate, compile, minify.
//!
//! Inputs are concatenated in file-set order (the order of the configured
//! source list matters), piped through the optional compiler, then through
//! the configured minifier or the built-in [`compact_js`].

use std::fs;

use tracing::{debug, warn};

use super::tool::{describe_failure, ExternalTool};
use super::{write_output, StepContext, TransformResult, TransformStep};
use crate::matcher::FileSet;

#[derive(Debug, Clone)]
pub struct ScriptBundler {
    /// File name of the bundle written into the destination directory.
    pub bundle_name: String,
    pub compiler: Option<ExternalTool>,
    pub minifier: Option<ExternalTool>,
}

impl ScriptBundler {
    pub fn new(bundle_name: impl Into<String>) -> Self {
        Self {
            bundle_name: bundle_name.into(),
            compiler: None,
            minifier: None,
        }
    }

    pub fn with_tools(mut self, compiler: Option<ExternalTool>, minifier: Option<ExternalTool>) -> Self {
        self.compiler = compiler;
        self.minifier = minifier;
        self
    }
}

impl TransformStep for ScriptBundler {
    fn name(&self) -> &'static str {
        "scripts"
    }

    fn apply(&self, input: &FileSet, ctx: &StepContext) -> TransformResult {
        let mut result = TransformResult::default();
        let mut bundle = String::new();
        let mut contributors = Vec::new();

        for path in input {
            match fs::read_to_string(path) {
                Ok(src) => {
                    if !bundle.is_empty() {
                        bundle.push('\n');
                    }
                    bundle.push_str(&src);
                    contributors.push(path.clone());
                }
                Err(e) => result.fail(path, format!("reading input: {e}")),
            }
        }

        if contributors.is_empty() {
            if input.is_empty() {
                warn!(bundle = %self.bundle_name, "no script sources matched; bundle not written");
            }
            return result;
        }

        let out_path = ctx.dest.join(&self.bundle_name);
        let produced = self
            .compile_and_minify(bundle, ctx)
            .and_then(|code| {
                write_output(&out_path, code.as_bytes())
                    .map_err(|e| format!("writing bundle: {e}"))
            });

        match produced {
            Ok(()) => {
                debug!(
                    bundle = %out_path.display(),
                    inputs = contributors.len(),
                    "wrote script bundle"
                );
                result.written.push(out_path);
            }
            Err(msg) => {
                // The bundle is all-or-nothing: every file that went into it
                // shares the failure.
                for path in &contributors {
                    result.fail(path, msg.clone());
                }
            }
        }

        result
    }
}

impl ScriptBundler {
    fn compile_and_minify(&self, bundle: String, ctx: &StepContext) -> Result<String, String> {
        let mut code = bundle;

        if let Some(compiler) = &self.compiler {
            let out = compiler
                .pipe(code.as_bytes(), &ctx.root)
                .map_err(|e| format!("compiling: {}", describe_failure(&e)))?;
            code = String::from_utf8_lossy(&out).into_owned();
        }

        match &self.minifier {
            Some(minifier) => {
                let out = minifier
                    .pipe(code.as_bytes(), &ctx.root)
                    .map_err(|e| format!("minifying: {}", describe_failure(&e)))?;
                Ok(String::from_utf8_lossy(&out).into_owned())
            }
            None => Ok(compact_js(&code)),
        }
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether a `/` after `prev` (and the identifier `word`) starts a regex
/// literal rather than a division.
fn regex_allowed(prev: Option<char>, word: &str) -> bool {
    match prev {
        None => true,
        Some(c) if "(,=:[!&|?{};+-*%<>~^".contains(c) => true,
        Some(c) if is_word(c) => matches!(
            word,
            "return" | "typeof" | "case" | "do" | "else" | "in" | "instanceof" | "new" | "void" | "yield" | "delete" | "throw"
        ),
        _ => false,
    }
}

/// Conservative JavaScript compaction.
///
/// Strips comments and collapses whitespace while copying string, template
/// and regex literals verbatim. Newlines survive wherever automatic
/// semicolon insertion could depend on them.
pub fn compact_js(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut pending: Option<bool> = None; // Some(saw_newline)
    let mut prev: Option<char> = None;
    let mut word = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            pending = Some(pending.unwrap_or(false) || c == '\n' || c == '\r');
            i += 1;
            continue;
        }

        if c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        if c == '/' && next == Some('*') {
            let mut saw_newline = false;
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                saw_newline |= chars[i] == '\n';
                i += 1;
            }
            i += 2;
            pending = Some(pending.unwrap_or(false) || saw_newline);
            continue;
        }

        flush_whitespace(&mut out, &mut pending, prev, &word, c);

        if c == '"' || c == '\'' || c == '`' {
            i = copy_quoted(&chars, i, &mut out);
            prev = Some(c);
            word.clear();
            continue;
        }

        if c == '/' && regex_allowed(prev, &word) {
            i = copy_regex(&chars, i, &mut out);
            prev = Some('/');
            word.clear();
            continue;
        }

        out.push(c);
        if is_word(c) {
            if !prev.is_some_and(is_word) {
                word.clear();
            }
            word.push(c);
        } else {
            word.clear();
        }
        prev = Some(c);
        i += 1;
    }

    out
}

fn flush_whitespace(
    out: &mut String,
    pending: &mut Option<bool>,
    prev: Option<char>,
    word: &str,
    next: char,
) {
    let Some(saw_newline) = pending.take() else {
        return;
    };
    let Some(prev) = prev else {
        return;
    };

    if saw_newline {
        let joinable = ";{,([=:".contains(prev) || ")]},;.".contains(next);
        if !joinable {
            out.push('\n');
            return;
        }
    }

    let needs_space = (is_word(prev) && (is_word(next) || next == '\\'))
        || (prev == next && (prev == '+' || prev == '-'))
        || (prev == '/' && next == '/')
        // `1 .x` would otherwise read as the number `1.`
        || (next == '.' && is_word(prev) && word.starts_with(|c: char| c.is_ascii_digit()));
    if needs_space {
        out.push(' ');
    }
}

/// Copy a string or template literal starting at `start`; returns the index
/// after the closing quote.
fn copy_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == '\\' {
            if let Some(&escaped) = chars.get(i) {
                out.push(escaped);
                i += 1;
            }
            continue;
        }
        if c == quote {
            break;
        }
    }
    i
}

/// Copy a regex literal (body and flags) starting at `start`.
fn copy_regex(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('/');
    let mut i = start + 1;
    let mut in_class = false;
    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            break;
        }
        out.push(c);
        i += 1;
        match c {
            '\\' => {
                if let Some(&escaped) = chars.get(i) {
                    out.push(escaped);
                    i += 1;
                }
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => break,
            _ => {}
        }
    }
    while i < chars.len() && chars[i].is_ascii_alphabetic() {
        out.push(chars[i]);
        i += 1;
    }
    i
}
