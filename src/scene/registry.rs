//! Registry of live tracked objects, walked by the reload sweep.

use super::object::{ObjectHandle, ObjectId, SceneObject};
use crate::unit::HostSurface;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};

/// Observes objects without owning them: a dropped object disappears from
/// [`live`](Self::live) on its own. One registry per editor session.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: RwLock<FxHashMap<ObjectId, Weak<parking_lot::Mutex<SceneObject>>>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, object: &ObjectHandle) {
        let id = object.lock().id();
        self.objects.write().insert(id, Arc::downgrade(object));
    }

    pub fn unregister(&self, id: ObjectId) -> bool {
        self.objects.write().remove(&id).is_some()
    }

    /// Create, register and return a new object. The caller owns it.
    pub fn spawn(&self, name: impl Into<String>, host: &HostSurface) -> ObjectHandle {
        let handle = SceneObject::new(name, host).into_handle();
        self.register(&handle);
        handle
    }

    /// Strong handles to every live object, ordered by id. Dead entries are
    /// pruned.
    pub fn live(&self) -> Vec<ObjectHandle> {
        let mut objects = self.objects.write();
        objects.retain(|_, weak| weak.strong_count() > 0);

        let mut live: Vec<_> = objects
            .iter()
            .filter_map(|(id, weak)| weak.upgrade().map(|h| (*id, h)))
            .collect();
        live.sort_by_key(|(id, _)| *id);
        live.into_iter().map(|(_, h)| h).collect()
    }

    pub fn len(&self) -> usize {
        self.objects
            .read()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.objects.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_unregister() {
        let host = HostSurface::engine_core();
        let registry = ObjectRegistry::new();
        let a = registry.spawn("A", &host);
        let b = registry.spawn("B", &host);
        assert_eq!(registry.len(), 2);

        let names: Vec<_> = registry.live().iter().map(|h| h.lock().name.clone()).collect();
        assert_eq!(names, vec!["A", "B"]);

        assert!(registry.unregister(a.lock().id()));
        assert_eq!(registry.len(), 1);
        drop(b);
    }

    #[test]
    fn test_dropped_objects_vanish() {
        let host = HostSurface::engine_core();
        let registry = ObjectRegistry::new();
        let keep = registry.spawn("Keep", &host);
        drop(registry.spawn("Temp", &host));

        let live = registry.live();
        assert_eq!(live.len(), 1);
        assert!(Arc::ptr_eq(&live[0], &keep));
    }

    #[test]
    fn test_register_is_independent_of_ownership() {
        let host = HostSurface::engine_core();
        let registry = ObjectRegistry::new();
        let obj = SceneObject::new("Outside", &host).into_handle();
        registry.register(&obj);
        registry.register(&obj);
        assert_eq!(registry.len(), 1);
    }
}
