// src/paths.rs

//! Path helpers shared by the matcher, the manifest generator and the watcher.

use std::path::{Path, PathBuf};

/// Render `path` relative to `root` with forward slashes.
///
/// Falls back to comparing canonical forms, which matters on macOS where
/// watcher events report `/private/var/...` for a `/var/...` root.
pub fn relative_slash(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = path.canonicalize().ok()?;
    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}

/// Normalise a relative path to a `/`-separated string.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make `root` absolute without requiring it to exist.
pub fn absolute(root: &Path) -> PathBuf {
    if let Ok(canon) = root.canonicalize() {
        return canon;
    }
    std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf())
}
