use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

pub(super) type NotifyTx = mpsc::UnboundedSender<notify::Result<notify::Event>>;

/// The watched script root and its (optional) subscription.
///
/// A root that is empty or missing is not an error; it simply stays
/// detached until a later `maintain` finds it.
pub(super) struct WatchRoot {
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
    tx: NotifyTx,
}

impl WatchRoot {
    pub(super) fn new(path: PathBuf, tx: NotifyTx) -> Self {
        Self {
            path,
            watcher: None,
            tx,
        }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// Subscribe to the root if it exists. Returns whether it is attached.
    pub(super) fn attach(&mut self) -> bool {
        if self.watcher.is_some() {
            return true;
        }
        if self.path.as_os_str().is_empty() || !self.path.is_dir() {
            return false;
        }

        let tx = self.tx.clone();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .and_then(|mut w| w.watch(&self.path, RecursiveMode::Recursive).map(|()| w));

        match watcher {
            Ok(w) => {
                crate::debug!("watch"; "attached: {}", self.path.display());
                self.watcher = Some(w);
                true
            }
            Err(e) => {
                crate::log!("watch"; "cannot watch {}: {}", self.path.display(), e);
                false
            }
        }
    }

    /// Drop the subscription if the root vanished, re-attach if it is back.
    pub(super) fn maintain(&mut self) -> bool {
        if self.watcher.is_some() && !self.path.is_dir() {
            crate::debug!("watch"; "root vanished: {}", self.path.display());
            self.detach();
        }
        self.attach()
    }

    pub(super) fn detach(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            let _ = watcher.unwatch(&self.path);
        }
    }
}

impl Drop for WatchRoot {
    fn drop(&mut self) {
        self.detach();
    }
}
