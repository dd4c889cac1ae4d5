//! Tracked scene objects and the reload-time sweep over them.

mod audit;
mod component;
mod migrate;
mod object;
mod registry;

pub use audit::{LeakReport, audit};
pub use component::{ComponentError, ComponentInstance, InstanceId, PropertyError};
pub use migrate::{MigrationReport, migrate_instance, reload_all};
pub use object::{Added, ObjectHandle, ObjectId, SceneObject};
pub use registry::ObjectRegistry;
