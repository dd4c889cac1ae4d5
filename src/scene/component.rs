//! Component instances: a type handle plus one value per member.

use crate::unit::{ComponentDef, TypeHandle, UnitId, UnitOrigin, Value, ValueType};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("`{ty}` has no member `{name}`")]
    Unknown { ty: String, name: String },

    #[error("property `{0}` is not readable")]
    NotReadable(String),

    #[error("property `{0}` is not writable")]
    NotWritable(String),

    #[error("`{name}` expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: ValueType,
        found: ValueType,
    },

    #[error("{value} is outside the range [{min}, {max}] of `{name}`")]
    OutOfRange {
        name: String,
        value: Value,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    #[error("cannot instantiate abstract component `{0}`")]
    Abstract(String),

    #[error("`{0}` is not a component type")]
    NotAComponent(String),

    #[error("the transform cannot be removed")]
    TransformRemoval,

    #[error("object has no `{0}` component")]
    NotFound(String),
}

/// Identity of one component instance. A migrated instance gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
pub struct ComponentInstance {
    id: InstanceId,
    ty: TypeHandle,
    fields: Vec<Value>,
    properties: Vec<Value>,
}

impl ComponentInstance {
    /// Default-constructed instance of `ty`.
    pub fn new(ty: TypeHandle) -> Result<Self, ComponentError> {
        let def = ty.def();
        if def.is_abstract {
            return Err(ComponentError::Abstract(def.name.clone()));
        }
        let fields = def.fields.iter().map(|f| f.default.clone()).collect();
        let properties = def.properties.iter().map(|p| p.default.clone()).collect();
        Ok(Self {
            id: InstanceId::next(),
            ty,
            fields,
            properties,
        })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn type_handle(&self) -> &TypeHandle {
        &self.ty
    }

    pub fn def(&self) -> &ComponentDef {
        self.ty.def()
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn unit_id(&self) -> UnitId {
        self.ty.unit_id()
    }

    pub fn origin(&self) -> UnitOrigin {
        self.ty.origin()
    }

    /// `(name, value)` of every field, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.def()
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        let index = self.def().fields.iter().position(|f| f.name == name)?;
        self.fields.get(index)
    }

    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        let def = self.ty.def();
        let Some(index) = def.fields.iter().position(|f| f.name == name) else {
            return Err(self.unknown(name));
        };
        check_type(name, &def.fields[index].ty, &value)?;
        self.fields[index] = value;
        Ok(())
    }

    /// Read through the property getter.
    pub fn property(&self, name: &str) -> Result<&Value, PropertyError> {
        let def = self.ty.def();
        let Some(index) = def.properties.iter().position(|p| p.name == name) else {
            return Err(self.unknown(name));
        };
        if !def.properties[index].readable {
            return Err(PropertyError::NotReadable(name.to_string()));
        }
        Ok(&self.properties[index])
    }

    /// Write through the property setter, including range validation.
    pub fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        let def = self.ty.def();
        let Some(index) = def.properties.iter().position(|p| p.name == name) else {
            return Err(self.unknown(name));
        };
        let prop = &def.properties[index];
        if !prop.writable {
            return Err(PropertyError::NotWritable(name.to_string()));
        }
        check_type(name, &prop.ty, &value)?;
        if let (Some((min, max)), false) = (prop.range, prop.in_range(&value)) {
            return Err(PropertyError::OutOfRange {
                name: name.to_string(),
                value,
                min,
                max,
            });
        }
        self.properties[index] = value;
        Ok(())
    }

    fn unknown(&self, name: &str) -> PropertyError {
        PropertyError::Unknown {
            ty: self.type_name().to_string(),
            name: name.to_string(),
        }
    }
}

fn check_type(name: &str, expected: &ValueType, value: &Value) -> Result<(), PropertyError> {
    let found = value.value_type();
    if &found == expected {
        Ok(())
    } else {
        Err(PropertyError::TypeMismatch {
            name: name.to_string(),
            expected: expected.clone(),
            found,
        })
    }
}
