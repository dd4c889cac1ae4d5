//! Reload notifications for collaborators (GUI console, inspector, CLI).

use crate::scene::{LeakReport, MigrationReport};
use crate::script::Diagnostic;
use crate::unit::UnitIdentity;
use crossbeam::channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub enum ReloadEvent {
    /// The change detector saw a settled burst of script edits.
    ScriptsChanged,
    /// Every diagnostic of one compile, success or not.
    CompileDiagnostics(Vec<Diagnostic>),
    CompileSucceeded(UnitIdentity),
    UnitLoaded(UnitIdentity),
    Migrated(MigrationReport),
    /// A retired unit was released, immediately or on a later reload.
    UnitUnloaded(UnitIdentity),
    /// A retired unit is still referenced by the listed components.
    UnitLeaked {
        unit: UnitIdentity,
        holders: Vec<LeakReport>,
    },
}

/// Fan-out of [`ReloadEvent`]s. Each subscriber gets its own unbounded
/// channel; dropped receivers are pruned on the next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<ReloadEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<ReloadEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn emit(&self, event: ReloadEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
