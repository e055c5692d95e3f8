//! Polling watcher over the save file.
//!
//! Emulators rewrite the save in bursts, so a detected change is held for
//! a debounce window before the reload fires, giving a slow writer time to
//! finish. Reload tokens go through a capacity-1 channel; changes that
//! land while the consumer is busy coalesce into one pending reload.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy)]
pub struct WatchConfig {
    pub poll_interval: Duration,
    pub debounce: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            debounce: Duration::from_millis(600),
        }
    }
}

/// What the watcher currently sees at the save path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchStatus {
    Watching,
    FileNotFound,
    Error(String),
}

/// Modification time and length taken together; either changing counts as
/// a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileSignature {
    modified: SystemTime,
    len: u64,
}

/// Last observed signature, separated from I/O so it can be driven
/// directly in tests.
#[derive(Debug, Default)]
pub(crate) struct WatchState {
    last: Option<FileSignature>,
}

impl WatchState {
    /// Record one polled signature; returns true when it differs from the
    /// last observed one. The very first read counts as a change, which is
    /// what triggers the initial load after startup.
    pub(crate) fn observe(&mut self, sig: FileSignature) -> bool {
        let changed = self.last != Some(sig);
        self.last = Some(sig);
        changed
    }

    /// Forget the last signature, so the file reappearing after an error
    /// or deletion registers as a change even with an identical signature.
    pub(crate) fn reset(&mut self) {
        self.last = None;
    }
}

/// Handle to a running watcher task.
pub struct WatcherHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Signal the watcher to stop and wait for the task to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

pub struct SaveWatcher {
    path: PathBuf,
    config: WatchConfig,
}

impl SaveWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: WatchConfig::default(),
        }
    }

    pub fn with_config(path: impl Into<PathBuf>, config: WatchConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Start polling. Returns the task handle, the reload token channel
    /// and the status channel.
    pub fn spawn(
        self,
    ) -> (
        WatcherHandle,
        mpsc::Receiver<()>,
        watch::Receiver<WatchStatus>,
    ) {
        let (reload_tx, reload_rx) = mpsc::channel(1);
        let (status_tx, status_rx) = watch::channel(WatchStatus::Watching);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut state = WatchState::default();
            tracing::info!(path = %self.path.display(), "watching save file");
            loop {
                match signature(&self.path).await {
                    Ok(sig) => {
                        set_status(&status_tx, WatchStatus::Watching);
                        if state.observe(sig) {
                            // Let a slow writer finish before reloading.
                            if !sleep_unless_shutdown(self.config.debounce, &mut shutdown_rx).await
                            {
                                return;
                            }
                            // The write may have continued during the
                            // debounce; the settled signature is the one
                            // to remember. If the file vanished instead,
                            // there is nothing to reload.
                            match signature(&self.path).await {
                                Ok(settled) => {
                                    state.observe(settled);
                                    tracing::debug!(path = %self.path.display(), "save changed, signaling reload");
                                    // A full channel already holds a
                                    // pending reload; the new change
                                    // coalesces into it.
                                    let _ = reload_tx.try_send(());
                                }
                                Err(error) => {
                                    state.reset();
                                    set_status(&status_tx, status_for(&error));
                                }
                            }
                        }
                    }
                    Err(error) => {
                        state.reset();
                        set_status(&status_tx, status_for(&error));
                    }
                }

                if !sleep_unless_shutdown(self.config.poll_interval, &mut shutdown_rx).await {
                    tracing::debug!("watcher shutting down");
                    return;
                }
            }
        });

        (
            WatcherHandle {
                shutdown: shutdown_tx,
                task,
            },
            reload_rx,
            status_rx,
        )
    }
}

/// Sleep for `duration`; false when the shutdown flag flips first.
async fn sleep_unless_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = shutdown.changed() => false,
    }
}

fn status_for(error: &std::io::Error) -> WatchStatus {
    if error.kind() == std::io::ErrorKind::NotFound {
        WatchStatus::FileNotFound
    } else {
        WatchStatus::Error(error.to_string())
    }
}

async fn signature(path: &Path) -> std::io::Result<FileSignature> {
    let meta = tokio::fs::metadata(path).await?;
    Ok(FileSignature {
        modified: meta.modified()?,
        len: meta.len(),
    })
}

/// Publish a status only when it differs from the current one, so
/// subscribers wake on transitions rather than every poll.
fn set_status(tx: &watch::Sender<WatchStatus>, status: WatchStatus) {
    tx.send_if_modified(|current| {
        if *current == status {
            false
        } else {
            if status != WatchStatus::Watching {
                tracing::warn!(status = ?status, "save watcher status changed");
            }
            *current = status;
            true
        }
    });
}
