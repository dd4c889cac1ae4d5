//! Compiled units and the isolation boundary around them.
//!
//! A [`Unit`] owns every type one compilation produced. Live components
//! point at their type through a [`TypeHandle`], which holds an `Arc` to the
//! defining unit: as long as one component of an old generation exists, that
//! generation stays loaded. [`LoadContext`] uses this to tell whether a
//! retired unit was actually released.

mod context;
mod host;
mod image;
mod types;

pub use context::{LoadContext, UnloadOutcome};
pub use host::{BEHAVIOUR, COMPONENT, CORE_UNIT_NAME, HostSurface, TRANSFORM};
pub use image::{FORMAT_VERSION, MAGIC, UnitError, UnitImage};
pub use types::{ComponentDef, EnumDef, FieldDef, PropertyDef, TypeDef, Value, ValueType};

use rustc_hash::FxHashMap;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a loaded unit. Two loads of the same image get
/// different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    fn next() -> Self {
        Self(NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Name plus load identity, cheap to clone into events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitIdentity {
    pub id: UnitId,
    pub name: String,
}

impl fmt::Display for UnitIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Engine-provided or compiled from user scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitOrigin {
    Core,
    Script,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Component(usize),
    Enum(usize),
}

/// A loaded set of type definitions.
#[derive(Debug)]
pub struct Unit {
    id: UnitId,
    name: String,
    origin: UnitOrigin,
    components: Vec<ComponentDef>,
    enums: Vec<EnumDef>,
    index: FxHashMap<String, Slot>,
}

impl Unit {
    pub fn from_image(image: UnitImage, origin: UnitOrigin) -> Arc<Self> {
        Self::from_types(image.name, origin, image.types)
    }

    pub fn from_types(name: impl Into<String>, origin: UnitOrigin, types: Vec<TypeDef>) -> Arc<Self> {
        let mut components = Vec::new();
        let mut enums = Vec::new();
        let mut index = FxHashMap::default();

        for def in types {
            match def {
                TypeDef::Component(c) => {
                    index.insert(c.name.clone(), Slot::Component(components.len()));
                    components.push(c);
                }
                TypeDef::Enum(e) => {
                    index.insert(e.name.clone(), Slot::Enum(enums.len()));
                    enums.push(e);
                }
            }
        }

        Arc::new(Self {
            id: UnitId::next(),
            name: name.into(),
            origin,
            components,
            enums,
            index,
        })
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> UnitOrigin {
        self.origin
    }

    pub fn identity(&self) -> UnitIdentity {
        UnitIdentity {
            id: self.id,
            name: self.name.clone(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentDef> {
        match self.index.get(name)? {
            Slot::Component(i) => self.components.get(*i),
            Slot::Enum(_) => None,
        }
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        match self.index.get(name)? {
            Slot::Enum(i) => self.enums.get(*i),
            Slot::Component(_) => None,
        }
    }

    /// All component definitions, abstract ones included, in declaration order.
    pub fn components(&self) -> &[ComponentDef] {
        &self.components
    }

    pub fn enums(&self) -> &[EnumDef] {
        &self.enums
    }

    pub fn type_count(&self) -> usize {
        self.components.len() + self.enums.len()
    }

    /// Concrete component types.
    pub fn component_types(&self) -> impl Iterator<Item = &ComponentDef> {
        self.components.iter().filter(|c| !c.is_abstract)
    }

    /// Concrete components deriving, directly or not, from `base`.
    pub fn subclasses_of<'a>(&'a self, base: &'a str) -> impl Iterator<Item = &'a ComponentDef> + 'a {
        self.component_types().filter(move |c| c.is_subclass_of(base))
    }

    pub fn to_image(&self) -> UnitImage {
        let types = self
            .enums
            .iter()
            .cloned()
            .map(TypeDef::Enum)
            .chain(self.components.iter().cloned().map(TypeDef::Component))
            .collect();
        UnitImage::new(self.name.clone(), types)
    }
}

/// Reference from a live component to its component type.
///
/// Holding a handle keeps the whole defining unit alive.
#[derive(Debug, Clone)]
pub struct TypeHandle {
    unit: Arc<Unit>,
    index: usize,
}

impl TypeHandle {
    /// Look up a component type by fully-qualified name.
    pub fn resolve(unit: &Arc<Unit>, name: &str) -> Option<Self> {
        match unit.index.get(name)? {
            Slot::Component(index) => Some(Self {
                unit: Arc::clone(unit),
                index: *index,
            }),
            Slot::Enum(_) => None,
        }
    }

    pub fn def(&self) -> &ComponentDef {
        &self.unit.components[self.index]
    }

    pub fn name(&self) -> &str {
        &self.def().name
    }

    pub fn unit(&self) -> &Arc<Unit> {
        &self.unit
    }

    pub fn unit_id(&self) -> UnitId {
        self.unit.id
    }

    pub fn origin(&self) -> UnitOrigin {
        self.unit.origin
    }

    /// Same type in the same loaded unit.
    pub fn same_type(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.unit, &other.unit) && self.index == other.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mover() -> ComponentDef {
        ComponentDef {
            name: "Game.Mover".into(),
            is_abstract: false,
            base: Some("Behaviour".into()),
            ancestors: vec!["Behaviour".into(), "Component".into()],
            fields: vec![FieldDef {
                name: "speed".into(),
                ty: ValueType::Float,
                default: Value::Float(5.0),
            }],
            properties: Vec::new(),
        }
    }

    fn sample_unit() -> Arc<Unit> {
        Unit::from_types(
            "ScriptAssembly_00000000",
            UnitOrigin::Script,
            vec![
                TypeDef::Component(mover()),
                TypeDef::Component(ComponentDef {
                    name: "Game.Base".into(),
                    is_abstract: true,
                    ..mover()
                }),
                TypeDef::Enum(EnumDef {
                    name: "Game.Team".into(),
                    variants: vec!["Red".into()],
                }),
            ],
        )
    }

    #[test]
    fn test_lookup_by_kind() {
        let unit = sample_unit();
        assert!(unit.component("Game.Mover").is_some());
        assert!(unit.component("Game.Team").is_none());
        assert!(unit.enum_def("Game.Team").is_some());
        assert_eq!(unit.type_count(), 3);
    }

    #[test]
    fn test_subclasses_skip_abstract() {
        let unit = sample_unit();
        let names: Vec<_> = unit.subclasses_of("Behaviour").map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Game.Mover"]);
    }

    #[test]
    fn test_handle_keeps_unit_alive() {
        let unit = sample_unit();
        let weak = Arc::downgrade(&unit);
        let handle = TypeHandle::resolve(&unit, "Game.Mover").unwrap();
        drop(unit);
        assert_eq!(weak.strong_count(), 1);
        assert_eq!(handle.def().simple_name(), "Mover");
        drop(handle);
        assert_eq!(weak.strong_count(), 0);
    }

    #[test]
    fn test_reloaded_image_is_distinct_type() {
        let first = sample_unit();
        let second = Unit::from_image(first.to_image(), UnitOrigin::Script);
        assert_ne!(first.id(), second.id());
        let a = TypeHandle::resolve(&first, "Game.Mover").unwrap();
        let b = TypeHandle::resolve(&second, "Game.Mover").unwrap();
        assert_eq!(a.name(), b.name());
        assert!(!a.same_type(&b));
    }
}
