//! Change detector for the script root.
//!
//! Raises one [`CompilerMsg::ScriptsChanged`] per settled burst of edits,
//! no sooner than the quiet period after the last matching event.
//!
//! ```text
//! notify ──► unbounded mpsc ──► Debouncer ──quiet──► CompilerMsg::ScriptsChanged
//! retry tick ──► WatchRoot::maintain            (Retrying ⇄ Watching)
//! ```
//!
//! The "Watcher-First" rule applies: the subscription is attached in
//! [`ChangeDetector::initialize`], before the caller's initial build, so
//! edits made during that build are buffered rather than lost.

mod debouncer;
mod root;
mod types;


pub use types::{ChangeBatch, ChangeKind, WatchState};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::actor::messages::CompilerMsg;
use debouncer::Debouncer;
use root::WatchRoot;
use types::SharedState;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_RETRY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Quiet period before a burst is reported.
    pub debounce: Duration,
    /// Poll interval while the root is missing.
    pub retry: Duration,
    /// Tracked extension, without the dot.
    pub extension: String,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            retry: DEFAULT_RETRY,
            extension: "nes".to_string(),
        }
    }
}

/// Handle to a running watch task. Dropping it disposes the watcher.
pub struct ChangeDetector {
    root: PathBuf,
    state: SharedState,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ChangeDetector {
    /// Start watching `root`. Must be called inside a tokio runtime.
    ///
    /// An empty or missing root puts the detector in [`WatchState::Retrying`].
    pub fn initialize(
        root: impl Into<PathBuf>,
        options: WatchOptions,
        compiler_tx: mpsc::Sender<CompilerMsg>,
    ) -> Self {
        let root = root.into();
        let state = SharedState::new();

        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let mut watch_root = WatchRoot::new(root.clone(), notify_tx);
        if watch_root.attach() {
            state.set(WatchState::Watching);
        } else {
            crate::debug!("watch"; "waiting for {}", root.display());
            state.set(WatchState::Retrying);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(
            watch_root,
            notify_rx,
            Debouncer::new(options.debounce, options.extension),
            options.retry,
            state.clone(),
            compiler_tx,
            shutdown_rx,
        ));

        Self {
            root,
            state,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> WatchState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop timers and unsubscribe. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.state.set(WatchState::Unwatched);
    }

    /// Dispose and wait until the subscription is released.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.state.set(WatchState::Unwatched);
    }
}

impl Drop for ChangeDetector {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn run(
    mut root: WatchRoot,
    mut events: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
    mut debouncer: Debouncer,
    retry: Duration,
    state: SharedState,
    compiler_tx: mpsc::Sender<CompilerMsg>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut next_retry = Instant::now() + retry;

    loop {
        let retry_in = next_retry.saturating_duration_since(Instant::now());
        let wake = debouncer.sleep_duration().min(retry_in);

        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            Some(result) = events.recv() => match result {
                Ok(event) => debouncer.add_event(&event),
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            },
            _ = tokio::time::sleep(wake) => {
                if Instant::now() >= next_retry {
                    next_retry = Instant::now() + retry;
                    let attached = root.maintain();
                    state.set(if attached { WatchState::Watching } else { WatchState::Retrying });
                }

                if let Some(batch) = debouncer.take_if_ready() {
                    crate::debug!("watch"; "{} settled under {}", batch_summary(&batch), root.path().display());
                    if compiler_tx.send(CompilerMsg::ScriptsChanged(batch)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    root.detach();
    state.set(WatchState::Unwatched);
}

fn batch_summary(batch: &ChangeBatch) -> String {
    crate::utils::plural::plural_count(batch.len(), "change")
}
