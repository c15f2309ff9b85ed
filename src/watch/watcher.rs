// src/watch/watcher.rs

use std::path::Path;

use notify::event::EventKind;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::errors::{PipelineError, Result};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and forward every changed path to `runtime_tx`
/// as [`RuntimeEvent::PathChanged`].
///
/// Fails with [`PipelineError::WatchError`] when `root` is missing or the
/// platform backend refuses the subscription.
pub fn spawn_watcher(
    root: &Path,
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let watch_error = |message: String| PipelineError::WatchError {
        path: root.to_path_buf(),
        message,
    };

    if !root.is_dir() {
        return Err(watch_error("directory does not exist".to_string()));
    }
    let root = root.canonicalize()?;

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // Receiver gone means the session is over.
                let _ = event_tx.send(event);
            }
            Err(err) => {
                eprintln!("sitepipe: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .map_err(|e| watch_error(e.to_string()))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| watch_error(e.to_string()))?;

    info!(root = %root.display(), "file watcher started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!(?event, "received notify event");
            for path in event.paths {
                if runtime_tx.send(RuntimeEvent::PathChanged(path)).is_err() {
                    warn!("watch loop is gone; stopping event forwarding");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
