use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// What happened to a script file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    Renamed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::Renamed => "renamed",
        }
    }
}

/// One settled burst of script edits, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch(pub Vec<(PathBuf, ChangeKind)>);

impl ChangeBatch {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.0.iter().map(|(p, _)| p)
    }
}

/// Change detector lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WatchState {
    /// Not initialized, or disposed.
    Unwatched = 0,
    /// Root missing; polling for it on every retry tick.
    Retrying = 1,
    /// Filesystem subscription active.
    Watching = 2,
}

impl WatchState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Retrying,
            2 => Self::Watching,
            _ => Self::Unwatched,
        }
    }
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unwatched => "unwatched",
            Self::Retrying => "retrying",
            Self::Watching => "watching",
        })
    }
}

/// State shared between the detector handle and its task.
#[derive(Debug, Clone)]
pub(super) struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub(super) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(WatchState::Unwatched as u8)))
    }

    pub(super) fn get(&self) -> WatchState {
        WatchState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(super) fn set(&self, state: WatchState) {
        let prev = self.0.swap(state as u8, Ordering::AcqRel);
        if prev != state as u8 {
            crate::debug!("watch"; "{} -> {}", WatchState::from_u8(prev), state);
        }
    }
}
