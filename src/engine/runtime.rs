// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::serve::ReloadHandle;

use super::core::WatchCore;
use super::runner::Runner;
use super::RuntimeEvent;

/// Async shell around [`WatchCore`].
///
/// Reads events from the watcher channel, lets the core decide what to
/// rebuild, runs the rebuild through the same [`Runner`] the CLI uses and
/// notifies preview clients afterwards. Rebuilds never overlap: events that
/// arrive meanwhile wait in the channel.
pub struct WatchLoop<E: ExecutorBackend> {
    core: WatchCore,
    event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    runner: Runner<E>,
    debounce: Duration,
    reload: Option<ReloadHandle>,
}

impl<E: ExecutorBackend> fmt::Debug for WatchLoop<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchLoop")
            .field("core", &self.core)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> WatchLoop<E> {
    pub fn new(
        core: WatchCore,
        event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
        runner: Runner<E>,
        debounce: Duration,
    ) -> Self {
        Self {
            core,
            event_rx,
            runner,
            debounce,
            reload: None,
        }
    }

    pub fn with_reload(mut self, reload: ReloadHandle) -> Self {
        self.reload = Some(reload);
        self
    }

    /// Main loop; returns on shutdown or when the event channel closes.
    ///
    /// Hands the runner back so callers can inspect what it executed.
    pub async fn run(mut self) -> Result<Runner<E>> {
        info!("watching for changes");
        let mut channel_open = true;

        loop {
            // Changes seen during the last rebuild are already queued.
            if self.core.queue_is_empty() {
                let Some(event) = self.event_rx.recv().await else {
                    info!("watch event channel closed; exiting");
                    break;
                };
                if !self.core.step(event).keep_running {
                    info!("shutdown requested; stopping watch loop");
                    break;
                }
            }

            if !self.settle().await {
                info!("shutdown requested; stopping watch loop");
                break;
            }

            let batch = self.core.take_batch();
            if batch.is_empty() {
                continue;
            }

            info!(tasks = ?batch, "rebuilding");
            let rebuild = self.runner.run_many(&batch);
            tokio::pin!(rebuild);

            // Keep reading events while the rebuild runs so Ctrl-C is not
            // stuck behind a slow or signal-ignoring child.
            let outcome = loop {
                tokio::select! {
                    res = &mut rebuild => break Some(res),
                    event = self.event_rx.recv(), if channel_open => match event {
                        Some(event) => {
                            if !self.core.step(event).keep_running {
                                break None;
                            }
                        }
                        None => channel_open = false,
                    },
                }
            };

            match outcome {
                None => {
                    warn!("shutdown requested; abandoning rebuild");
                    break;
                }
                Some(Ok(report)) => {
                    info!(executed = report.executed.len(), "rebuild finished");
                    if let Some(reload) = &self.reload {
                        let clients = reload.notify();
                        debug!(clients, "sent reload notification");
                    }
                }
                Some(Err(err)) => {
                    warn!(error = %err, "rebuild failed; still watching");
                }
            }
        }

        Ok(self.runner)
    }

    /// Keep absorbing events until the channel is quiet for the debounce
    /// window. Returns false if a shutdown arrived meanwhile.
    async fn settle(&mut self) -> bool {
        if self.debounce.is_zero() {
            while let Ok(event) = self.event_rx.try_recv() {
                if !self.core.step(event).keep_running {
                    return false;
                }
            }
            return true;
        }

        loop {
            match timeout(self.debounce, self.event_rx.recv()).await {
                Ok(Some(event)) => {
                    if !self.core.step(event).keep_running {
                        return false;
                    }
                }
                // Closed channel: rebuild what we have, the next recv exits.
                Ok(None) => return true,
                Err(_) => return true,
            }
        }
    }
}
