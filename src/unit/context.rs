//! The single current-unit slot and the liveness witnesses of retired units.

use super::{Unit, UnitIdentity};
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Result of retiring a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnloadOutcome {
    /// No unit was current.
    Empty,
    /// The last strong reference is gone.
    Unloaded(UnitIdentity),
    /// Something still holds the unit. `refs` counts the outstanding handles.
    Leaked { unit: UnitIdentity, refs: usize },
}

#[derive(Debug)]
struct Retired {
    identity: UnitIdentity,
    witness: Weak<Unit>,
}

/// Owns the current unit. At most one unit is current at any time.
///
/// Readers call [`current`](Self::current) lock-free; the compiler is the
/// only writer.
#[derive(Debug, Default)]
pub struct LoadContext {
    current: ArcSwapOption<Unit>,
    retired: Mutex<Vec<Retired>>,
}

impl LoadContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Unit>> {
        self.current.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Make `unit` current, returning the previous one for retirement.
    pub fn install(&self, unit: Arc<Unit>) -> Option<Arc<Unit>> {
        self.current.swap(Some(unit))
    }

    /// Drop our reference to `unit` and check whether it was released.
    ///
    /// A unit that survives stays on the retired list until a later
    /// [`prune_retired`](Self::prune_retired) sees it go.
    pub fn retire(&self, unit: Arc<Unit>) -> UnloadOutcome {
        let identity = unit.identity();
        let witness = Arc::downgrade(&unit);
        drop(unit);

        match witness.strong_count() {
            0 => UnloadOutcome::Unloaded(identity),
            refs => {
                self.retired.lock().push(Retired {
                    identity: identity.clone(),
                    witness,
                });
                UnloadOutcome::Leaked {
                    unit: identity,
                    refs,
                }
            }
        }
    }

    /// Take the current unit out of the slot and retire it. No-op when empty.
    pub fn unload_current(&self) -> UnloadOutcome {
        match self.current.swap(None) {
            Some(unit) => self.retire(unit),
            None => UnloadOutcome::Empty,
        }
    }

    /// Forget retired units that have since been released, returning them.
    pub fn prune_retired(&self) -> Vec<UnitIdentity> {
        let mut released = Vec::new();
        self.retired.lock().retain(|r| {
            let alive = r.witness.strong_count() > 0;
            if !alive {
                released.push(r.identity.clone());
            }
            alive
        });
        released
    }

    /// Retired units that are still referenced.
    pub fn lingering(&self) -> Vec<UnitIdentity> {
        self.retired
            .lock()
            .iter()
            .filter(|r| r.witness.strong_count() > 0)
            .map(|r| r.identity.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitOrigin;

    fn unit() -> Arc<Unit> {
        Unit::from_types("ScriptAssembly_TEST0000", UnitOrigin::Script, Vec::new())
    }

    #[test]
    fn test_unload_when_empty_is_noop() {
        let ctx = LoadContext::new();
        assert_eq!(ctx.unload_current(), UnloadOutcome::Empty);
        assert_eq!(ctx.unload_current(), UnloadOutcome::Empty);
        assert!(ctx.lingering().is_empty());
    }

    #[test]
    fn test_unload_releases_unreferenced_unit() {
        let ctx = LoadContext::new();
        let u = unit();
        let id = u.identity();
        assert!(ctx.install(u).is_none());
        assert!(ctx.is_loaded());
        assert_eq!(ctx.unload_current(), UnloadOutcome::Unloaded(id));
        assert!(!ctx.is_loaded());
    }

    #[test]
    fn test_unload_reports_leak_then_prunes() {
        let ctx = LoadContext::new();
        let u = unit();
        let held = Arc::clone(&u);
        ctx.install(u);

        let outcome = ctx.unload_current();
        assert!(matches!(outcome, UnloadOutcome::Leaked { refs: 1, .. }));
        assert_eq!(ctx.lingering().len(), 1);
        assert!(ctx.prune_retired().is_empty());

        drop(held);
        let released = ctx.prune_retired();
        assert_eq!(released.len(), 1);
        assert!(ctx.lingering().is_empty());
    }

    #[test]
    fn test_install_returns_previous() {
        let ctx = LoadContext::new();
        let first = unit();
        let first_id = first.id();
        ctx.install(first);
        let previous = ctx.install(unit()).unwrap();
        assert_eq!(previous.id(), first_id);
        assert!(matches!(ctx.retire(previous), UnloadOutcome::Unloaded(_)));
    }
}
