//! Scene objects and their ordered component lists.

use super::component::{ComponentError, ComponentInstance};
use crate::unit::{HostSurface, TRANSFORM, TypeHandle};
use parking_lot::Mutex;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared handle. The scene owns objects; the registry only observes them.
pub type ObjectHandle = Arc<Mutex<SceneObject>>;

/// Outcome of [`SceneObject::add_component`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    /// New instance at this slot.
    New(usize),
    /// A component of that type was already attached at this slot.
    Existing(usize),
}

impl Added {
    pub fn index(self) -> usize {
        match self {
            Self::New(i) | Self::Existing(i) => i,
        }
    }
}

/// A tracked object: name plus components, the transform always first.
#[derive(Debug)]
pub struct SceneObject {
    id: ObjectId,
    pub name: String,
    pub active: bool,
    components: Vec<ComponentInstance>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, host: &HostSurface) -> Self {
        // The core transform is concrete, so construction cannot fail.
        let transform = ComponentInstance::new(host.transform());
        Self {
            id: ObjectId::next(),
            name: name.into(),
            active: true,
            components: transform.into_iter().collect(),
        }
    }

    pub fn into_handle(self) -> ObjectHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn transform(&self) -> Option<&ComponentInstance> {
        self.components.first()
    }

    pub fn components(&self) -> &[ComponentInstance] {
        &self.components
    }

    /// Attach a default instance of `ty`. Attaching a type the object already
    /// has returns the existing slot.
    pub fn add_component(&mut self, ty: TypeHandle) -> Result<Added, ComponentError> {
        if let Some(index) = self.position(ty.name()) {
            return Ok(Added::Existing(index));
        }
        let instance = ComponentInstance::new(ty)?;
        self.components.push(instance);
        Ok(Added::New(self.components.len() - 1))
    }

    pub fn remove_component(&mut self, type_name: &str) -> Result<ComponentInstance, ComponentError> {
        if type_name == TRANSFORM {
            return Err(ComponentError::TransformRemoval);
        }
        let index = self
            .position(type_name)
            .ok_or_else(|| ComponentError::NotFound(type_name.to_string()))?;
        Ok(self.components.remove(index))
    }

    pub fn get_component(&self, type_name: &str) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.type_name() == type_name)
    }

    pub fn get_component_mut(&mut self, type_name: &str) -> Option<&mut ComponentInstance> {
        self.components.iter_mut().find(|c| c.type_name() == type_name)
    }

    fn position(&self, type_name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.type_name() == type_name)
    }

    /// Swap a migrated instance into `index`, returning the old one.
    pub(crate) fn replace_component(&mut self, index: usize, instance: ComponentInstance) -> ComponentInstance {
        std::mem::replace(&mut self.components[index], instance)
    }
}
