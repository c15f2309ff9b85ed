// src/transform/html.rs

//! HTML minification.
//!
//! The built-in minifier works on the markup between raw-text blocks
//! (`pre`, `textarea`, `script`, `style`), whose contents are never touched;
//! only their opening tags get attribute treatment. An `html_minifier` tool
//! replaces it completely when configured.

use std::fs;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::debug;

use super::tool::{describe_failure, ExternalTool};
use super::{write_output, StepContext, TransformResult, TransformStep};
use crate::matcher::FileSet;

/// Flags controlling the built-in minifier. All enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HtmlMinifyOptions {
    pub remove_comments: bool,
    pub collapse_whitespace: bool,
    pub collapse_boolean_attributes: bool,
    pub remove_attribute_quotes: bool,
    pub remove_redundant_attributes: bool,
    pub remove_empty_attributes: bool,
    pub remove_script_type_attributes: bool,
    pub remove_style_link_type_attributes: bool,
    pub remove_optional_tags: bool,
}

impl Default for HtmlMinifyOptions {
    fn default() -> Self {
        Self {
            remove_comments: true,
            collapse_whitespace: true,
            collapse_boolean_attributes: true,
            remove_attribute_quotes: true,
            remove_redundant_attributes: true,
            remove_empty_attributes: true,
            remove_script_type_attributes: true,
            remove_style_link_type_attributes: true,
            remove_optional_tags: true,
        }
    }
}

impl HtmlMinifyOptions {
    /// Every flag off: output equals input.
    pub fn none() -> Self {
        Self {
            remove_comments: false,
            collapse_whitespace: false,
            collapse_boolean_attributes: false,
            remove_attribute_quotes: false,
            remove_redundant_attributes: false,
            remove_empty_attributes: false,
            remove_script_type_attributes: false,
            remove_style_link_type_attributes: false,
            remove_optional_tags: false,
        }
    }

    fn touches_attributes(&self) -> bool {
        self.collapse_boolean_attributes
            || self.remove_attribute_quotes
            || self.remove_redundant_attributes
            || self.remove_empty_attributes
            || self.remove_script_type_attributes
            || self.remove_style_link_type_attributes
    }
}

#[derive(Debug, Clone)]
pub struct HtmlMinifier {
    pub options: HtmlMinifyOptions,
    pub tool: Option<ExternalTool>,
}

impl HtmlMinifier {
    pub fn new(options: HtmlMinifyOptions) -> Self {
        Self {
            options,
            tool: None,
        }
    }

    pub fn with_tool(mut self, tool: Option<ExternalTool>) -> Self {
        self.tool = tool;
        self
    }
}

impl TransformStep for HtmlMinifier {
    fn name(&self) -> &'static str {
        "minify-html"
    }

    fn apply(&self, input: &FileSet, ctx: &StepContext) -> TransformResult {
        let mut result = TransformResult::default();

        for path in input {
            let out_path = ctx.output_path(path);

            let minified = match &self.tool {
                Some(tool) => match fs::read(path) {
                    Ok(bytes) => tool
                        .pipe(&bytes, &ctx.root)
                        .map_err(|e| describe_failure(&e)),
                    Err(e) => Err(format!("reading input: {e}")),
                },
                None => fs::read_to_string(path)
                    .map(|src| minify_html(&src, &self.options).into_bytes())
                    .map_err(|e| format!("reading input: {e}")),
            };

            match minified.and_then(|bytes| {
                write_output(&out_path, &bytes).map_err(|e| format!("writing output: {e}"))
            }) {
                Ok(()) => {
                    debug!(from = %path.display(), to = %out_path.display(), "minified html");
                    result.written.push(out_path);
                }
                Err(msg) => result.fail(path, msg),
            }
        }

        result
    }
}

static RAW_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<pre\b.*?</pre\s*>|<textarea\b.*?</textarea\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>",
    )
    .expect("raw block regex")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<([a-zA-Z][a-zA-Z0-9:-]*)((?:\s+[^\s"'<>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
    )
    .expect("tag regex")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'=<>`]+))?"#)
        .expect("attribute regex")
});

static OPTIONAL_END_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(?:li|dt|dd|option|tr|td|th|thead|tbody|tfoot|html|head|body)\s*>")
        .expect("optional end tag regex")
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("ws regex"));

static BLOCK_TAG_PADDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*(</?(?:!doctype|html|head|body|meta|link|title|base|div|p|ul|ol|li|dl|dt|dd|table|thead|tbody|tfoot|tr|td|th|section|article|header|footer|nav|main|aside|h[1-6]|hr|br|form|fieldset|figure|figcaption|blockquote|option|select|noscript)\b[^>]*>)\s*",
    )
    .expect("block tag regex")
});

const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "allowfullscreen",
    "async",
    "autofocus",
    "autoplay",
    "checked",
    "controls",
    "default",
    "defer",
    "disabled",
    "formnovalidate",
    "hidden",
    "ismap",
    "loop",
    "multiple",
    "muted",
    "nomodule",
    "novalidate",
    "open",
    "readonly",
    "required",
    "reversed",
    "selected",
];

const EMPTY_REMOVABLE: &[&str] = &["class", "id", "style", "title", "lang", "dir"];

/// Minify an HTML document with the given options.
pub fn minify_html(src: &str, opts: &HtmlMinifyOptions) -> String {
    let mut out = String::with_capacity(src.len());
    let mut last = 0;

    for block in RAW_BLOCK.find_iter(src) {
        out.push_str(&minify_markup(&src[last..block.start()], opts));
        out.push_str(&minify_raw_block(block.as_str(), opts));
        last = block.end();
    }
    out.push_str(&minify_markup(&src[last..], opts));

    if opts.collapse_whitespace {
        out.trim().to_string()
    } else {
        out
    }
}

fn minify_markup(segment: &str, opts: &HtmlMinifyOptions) -> String {
    let mut text = segment.to_string();

    if opts.remove_comments {
        text = COMMENT
            .replace_all(&text, |caps: &Captures| {
                let comment = &caps[0];
                if comment.starts_with("<!--[if") || comment.contains("<![endif]") {
                    comment.to_string()
                } else {
                    String::new()
                }
            })
            .into_owned();
    }

    if opts.touches_attributes() {
        text = TAG
            .replace_all(&text, |caps: &Captures| rewrite_tag(caps, opts))
            .into_owned();
    }

    if opts.remove_optional_tags {
        text = OPTIONAL_END_TAG.replace_all(&text, "").into_owned();
    }

    if opts.collapse_whitespace {
        text = WHITESPACE.replace_all(&text, " ").into_owned();
        text = BLOCK_TAG_PADDING.replace_all(&text, "$1").into_owned();
    }

    text
}

fn minify_raw_block(block: &str, opts: &HtmlMinifyOptions) -> String {
    if !opts.touches_attributes() {
        return block.to_string();
    }
    match block.find('>') {
        Some(end) => {
            let open = TAG
                .replace(&block[..=end], |caps: &Captures| rewrite_tag(caps, opts))
                .into_owned();
            format!("{open}{}", &block[end + 1..])
        }
        None => block.to_string(),
    }
}

struct Attribute {
    name: String,
    value: Option<String>,
}

fn rewrite_tag(caps: &Captures, opts: &HtmlMinifyOptions) -> String {
    let tag = &caps[1];
    let tag_lower = tag.to_ascii_lowercase();
    let raw_attrs = caps.get(2).map_or("", |m| m.as_str());
    let self_closing = !caps[3].is_empty();

    let attrs = ATTR.captures_iter(raw_attrs).map(|a| Attribute {
        name: a[1].to_string(),
        value: a.get(2).map(|v| unquote(v.as_str()).to_string()),
    });

    let mut out = format!("<{tag}");
    for mut attr in attrs {
        let name = attr.name.to_ascii_lowercase();
        let value = attr.value.as_deref().unwrap_or("");

        if opts.remove_empty_attributes
            && attr.value.is_some()
            && value.trim().is_empty()
            && (EMPTY_REMOVABLE.contains(&name.as_str()) || name.starts_with("on"))
        {
            continue;
        }
        if opts.remove_redundant_attributes && is_redundant(&tag_lower, &name, value) {
            continue;
        }
        if opts.remove_script_type_attributes
            && tag_lower == "script"
            && name == "type"
            && matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "text/javascript" | "application/javascript" | ""
            )
        {
            continue;
        }
        if opts.remove_style_link_type_attributes
            && (tag_lower == "style" || tag_lower == "link")
            && name == "type"
            && value.trim().eq_ignore_ascii_case("text/css")
        {
            continue;
        }
        if opts.collapse_boolean_attributes && BOOLEAN_ATTRIBUTES.contains(&name.as_str()) {
            attr.value = None;
        }

        out.push(' ');
        out.push_str(&attr.name);
        if let Some(value) = attr.value {
            out.push('=');
            out.push_str(&quote(&value, opts.remove_attribute_quotes));
        }
    }

    if self_closing {
        out.push('/');
    }
    out.push('>');
    out
}

fn is_redundant(tag: &str, attr: &str, value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    match (tag, attr) {
        ("script", "language") => value == "javascript",
        ("form", "method") => value == "get",
        ("input", "type") => value == "text",
        ("area", "shape") => value == "rect",
        _ => false,
    }
}

fn unquote(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if raw.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[raw.len() - 1] == bytes[0]
    {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

fn quote(value: &str, allow_bare: bool) -> String {
    let bare_ok = !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '`' | '/'));
    if allow_bare && bare_ok {
        value.to_string()
    } else if value.contains('"') {
        format!("'{value}'")
    } else {
        format!("\"{value}\"")
    }
}
