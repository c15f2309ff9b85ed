// src/manifest/mod.rs

//! Offline-caching manifest generation.
//!
//! A [`Manifest`] is a snapshot of the output tree: every file matching the
//! include globs, keyed by its URL path (`/` + path relative to the output
//! root) and fingerprinted by content. It is serialized into a service
//! worker script (see [`service_worker`]) and can be read back from one.

pub mod service_worker;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use anyhow::anyhow;
use blake3::Hasher;
use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::matcher::match_files;
use crate::paths::{absolute, relative_slash, to_slash};

pub use service_worker::render_service_worker;

/// URL path -> content fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Filesystem prefix removed from every entry (the output root). Never
    /// written into the worker script.
    pub strip_prefix: String,
    pub entries: BTreeMap<String, String>,
}

/// What `generate-service-worker` needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSpec {
    /// Output root, relative to the project root.
    pub output: std::path::PathBuf,
    /// Manifest file name inside the output root.
    pub file: String,
    pub include: Vec<String>,
    pub cache_id: String,
}

impl ManifestSpec {
    /// Generate the manifest under `root` and write the service worker.
    pub fn run(&self, root: &Path) -> Result<Manifest> {
        let output_root = root.join(&self.output);
        let manifest = Manifest::generate(&output_root, &self.include, Some(&self.file))?;
        manifest.write_to(&output_root.join(&self.file), &self.cache_id)?;
        info!(
            entries = manifest.len(),
            file = %self.file,
            "generated service worker"
        );
        Ok(manifest)
    }
}

/// Compute the blake3 fingerprint of a single file.
pub fn fingerprint(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = File::open(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

impl Manifest {
    /// Snapshot `output_root`. `skip` names a root-relative file (the
    /// manifest itself) that is never listed.
    pub fn generate<S: AsRef<str>>(
        output_root: &Path,
        include: &[S],
        skip: Option<&str>,
    ) -> Result<Manifest> {
        let output_root = absolute(output_root);
        let files = match_files(include, &output_root)?;
        let skip = skip.map(|s| s.trim_start_matches('/'));

        let mut entries = BTreeMap::new();
        for path in &files {
            let Some(rel) = relative_slash(&output_root, path) else {
                continue;
            };
            if skip == Some(rel.as_str()) {
                continue;
            }
            let hash = fingerprint(path)?;
            debug!(url = %format!("/{rel}"), hash = %hash, "fingerprinted file");
            entries.insert(format!("/{rel}"), hash);
        }

        Ok(Manifest {
            strip_prefix: to_slash(&output_root),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry whose URL ends with one of `suffixes`. Returns how
    /// many entries were dropped.
    pub fn prune_suffixes<S: AsRef<str>>(&mut self, suffixes: &[S]) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|url, _| !suffixes.iter().any(|s| url.ends_with(s.as_ref())));
        before - self.entries.len()
    }

    /// Version string for the cache name; changes whenever any entry does.
    pub fn cache_version(&self) -> String {
        let mut hasher = Hasher::new();
        for (url, hash) in &self.entries {
            hasher.update(url.as_bytes());
            hasher.update(b"\0");
            hasher.update(hash.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex()[..16].to_string()
    }

    pub fn write_to(&self, path: &Path, cache_id: &str) -> Result<()> {
        let script = render_service_worker(self, cache_id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, script)?;
        Ok(())
    }

    /// Parse a service worker written by [`Manifest::write_to`]. The
    /// script's directory is taken as the output root.
    pub fn read_from(path: &Path) -> Result<Manifest> {
        let text = fs::read_to_string(path)?;
        let entries = service_worker::parse(&text).map_err(|message| {
            PipelineError::Other(anyhow!("cannot read manifest {}: {message}", path.display()))
        })?;
        let path = absolute(path);
        let strip_prefix = path.parent().map(to_slash).unwrap_or_default();
        Ok(Manifest {
            strip_prefix,
            entries,
        })
    }
}

/// Drop entries ending with any of `suffixes` from the manifest at `path` and
/// rewrite it. Returns how many entries were removed.
pub fn prune_manifest_file<S: AsRef<str>>(path: &Path, suffixes: &[S], cache_id: &str) -> Result<usize> {
    let mut manifest = Manifest::read_from(path)?;
    let removed = manifest.prune_suffixes(suffixes);
    manifest.write_to(path, cache_id)?;
    info!(
        file = %path.display(),
        removed,
        remaining = manifest.len(),
        "pruned manifest entries"
    );
    Ok(removed)
}
