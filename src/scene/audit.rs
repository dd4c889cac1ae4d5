//! Leak auditor: which live components still pin a retired unit.

use super::registry::ObjectRegistry;
use crate::unit::UnitId;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakReport {
    pub object: String,
    pub component: String,
}

impl fmt::Display for LeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' still holds `{}`", self.object, self.component)
    }
}

/// List every registered component whose type comes from `unit`.
/// Diagnostic only; nothing is released.
pub fn audit(registry: &ObjectRegistry, unit: UnitId) -> Vec<LeakReport> {
    registry
        .live()
        .iter()
        .flat_map(|handle| {
            let object = handle.lock();
            object
                .components()
                .iter()
                .filter(|c| c.unit_id() == unit)
                .map(|c| LeakReport {
                    object: object.name.clone(),
                    component: c.type_name().to_string(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
