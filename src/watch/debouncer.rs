use std::path::PathBuf;
use std::time::{Duration, Instant};

use notify::event::{EventKind, ModifyKind};
use rustc_hash::FxHashMap;

use super::types::{ChangeBatch, ChangeKind};
use crate::utils::path::{has_extension, is_temp_file, normalize_path};

/// Coalesces raw notify events for one extension into a single batch,
/// released once no matching event arrived for `quiet`.
pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    quiet: Duration,
    extension: String,
}

impl Debouncer {
    pub(super) fn new(quiet: Duration, extension: impl Into<String>) -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            quiet,
            extension: extension.into(),
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Removed + Created/Modified/Renamed → the new kind (file was restored)
    /// - Modified/Renamed + Removed → Removed
    /// - Created + Removed → discarded
    /// - otherwise the first event wins
    ///
    /// Every matching path restarts the quiet period, including discarded ones.
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            // mtime/atime/chmod noise
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) || !has_extension(path, &self.extension) {
                continue;
            }
            let path = normalize_path(path);
            self.last_event = Some(Instant::now());

            let Some(&existing) = self.changes.get(&path) else {
                crate::debug!("watch"; "{}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
                continue;
            };

            match (existing, kind) {
                (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified | ChangeKind::Renamed) => {
                    self.changes.insert(path, kind);
                }
                (ChangeKind::Modified | ChangeKind::Renamed, ChangeKind::Removed) => {
                    self.changes.insert(path, ChangeKind::Removed);
                }
                (ChangeKind::Created, ChangeKind::Removed) => {
                    crate::debug!("watch"; "discard created+removed: {}", path.display());
                    self.changes.remove(&path);
                }
                _ => {}
            }
        }
    }

    /// Take the pending batch once the quiet period has elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<ChangeBatch> {
        let last_event = self.last_event?;
        if last_event.elapsed() < self.quiet {
            return None;
        }

        self.last_event = None;
        let changes = std::mem::take(&mut self.changes);
        if changes.is_empty() {
            return None;
        }

        let mut batch: Vec<_> = changes.into_iter().collect();
        batch.sort_by(|a, b| a.0.cmp(&b.0));
        Some(ChangeBatch(batch))
    }

    /// Time left until the pending batch settles.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        self.quiet
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }

    pub(super) fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }
}
