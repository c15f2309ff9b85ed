// src/matcher.rs

//! Glob evaluation into ordered, de-duplicated file lists.
//!
//! Patterns are evaluated relative to a root directory:
//!
//! - patterns run in declaration order, matches within a pattern in
//!   directory-walk order (sorted by file name);
//! - `!pattern` entries are exclusions applied after all positive patterns;
//! - `*` never crosses a `/`, `**` spans any number of directories and
//!   `{a,b}` alternation is supported;
//! - the first occurrence of a path wins.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::{PipelineError, Result};
use crate::paths::{absolute, relative_slash};

/// Ordered list of absolute file paths without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    paths: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, path: PathBuf) -> bool {
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.push(path);
        true
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FromIterator<PathBuf> for FileSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for path in iter {
            set.push(path);
        }
        set
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// One positive pattern, compiled.
struct PositivePattern {
    source: String,
    /// Leading directories of the pattern that contain no glob syntax.
    base: PathBuf,
    /// Set when the whole pattern is a plain relative path.
    literal: bool,
    matcher: GlobMatcher,
}

/// Resolve `patterns` against `root` into a [`FileSet`].
pub fn match_files<S: AsRef<str>>(patterns: &[S], root: &Path) -> Result<FileSet> {
    let root = absolute(root);
    let (positives, excludes) = compile_patterns(patterns, &root)?;

    let mut set = FileSet::new();
    if !root.is_dir() {
        debug!(root = %root.display(), "match root does not exist; empty file set");
        return Ok(set);
    }

    for pattern in &positives {
        let before = set.len();
        for path in candidates(&root, pattern) {
            let Some(rel) = relative_slash(&root, &path) else {
                continue;
            };
            if !pattern.matcher.is_match(&rel) {
                continue;
            }
            if excludes.as_ref().is_some_and(|ex| ex.is_match(&rel)) {
                continue;
            }
            set.push(path);
        }
        debug!(
            pattern = %pattern.source,
            added = set.len() - before,
            "evaluated glob pattern"
        );
    }

    Ok(set)
}

/// Check that every pattern compiles, without touching the filesystem.
pub fn validate_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<()> {
    for raw in patterns {
        let pattern = normalize(raw.as_ref(), None);
        let pattern = pattern.strip_prefix('!').unwrap_or(&pattern);
        compile_glob(pattern)?;
    }
    Ok(())
}

/// Compile a single glob with the matcher's separator semantics.
pub(crate) fn compile_glob(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| PipelineError::MatchError {
            pattern: pattern.to_string(),
            message: e.kind().to_string(),
        })
}

/// Build a [`GlobSet`] out of several patterns.
pub(crate) fn compile_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(&normalize(pat.as_ref(), None))?);
    }
    builder.build().map_err(|e| PipelineError::MatchError {
        pattern: patterns
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(", "),
        message: e.to_string(),
    })
}

fn compile_patterns<S: AsRef<str>>(
    patterns: &[S],
    root: &Path,
) -> Result<(Vec<PositivePattern>, Option<GlobSet>)> {
    let mut positives = Vec::new();
    let mut negatives = Vec::new();

    for raw in patterns {
        let pattern = normalize(raw.as_ref(), Some(root));
        if pattern.is_empty() {
            continue;
        }
        if let Some(negated) = pattern.strip_prefix('!') {
            negatives.push(normalize(negated, Some(root)));
            continue;
        }

        let matcher = compile_glob(&pattern)?.compile_matcher();
        let (base, literal) = literal_base(&pattern);
        positives.push(PositivePattern {
            source: pattern,
            base,
            literal,
            matcher,
        });
    }

    let excludes = if negatives.is_empty() {
        None
    } else {
        Some(compile_globset(&negatives)?)
    };

    Ok((positives, excludes))
}

/// Strip `./` prefixes and make absolute patterns under `root` relative.
fn normalize(pattern: &str, root: Option<&Path>) -> String {
    let (negated, mut body) = match pattern.trim().strip_prefix('!') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, pattern.trim()),
    };

    if let Some(root) = root {
        if let Ok(rel) = Path::new(body).strip_prefix(root) {
            let rel = rel.to_string_lossy().replace('\\', "/");
            return if negated { format!("!{rel}") } else { rel };
        }
    }

    while let Some(rest) = body.strip_prefix("./") {
        body = rest;
    }

    if negated {
        format!("!{body}")
    } else {
        body.to_string()
    }
}

fn has_glob_syntax(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Split a pattern into the directory prefix free of glob syntax.
fn literal_base(pattern: &str) -> (PathBuf, bool) {
    let components: Vec<&str> = pattern.split('/').collect();
    if !components.iter().any(|c| has_glob_syntax(c)) {
        return (PathBuf::from(pattern), true);
    }

    let mut base = PathBuf::new();
    for component in components.iter().take(components.len() - 1) {
        if has_glob_syntax(component) {
            break;
        }
        base.push(component);
    }
    (base, false)
}

/// Files that could match `pattern`, in deterministic walk order.
fn candidates(root: &Path, pattern: &PositivePattern) -> Vec<PathBuf> {
    let start = root.join(&pattern.base);

    if pattern.literal {
        return if start.is_file() { vec![start] } else { Vec::new() };
    }
    if !start.is_dir() {
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&start).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => warn!(
                pattern = %pattern.source,
                error = %err,
                "skipping unreadable entry while matching"
            ),
        }
    }
    files
}
