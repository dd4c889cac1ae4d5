//! Type and value model shared by compiled units and live components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a field or property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Str,
    Vec3,
    Color,
    /// Enum declared in a unit, by fully-qualified name.
    Enum(String),
}

impl ValueType {
    /// Map a builtin type keyword to its type.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "string" => Self::Str,
            "vec3" => Self::Vec3,
            "color" => Self::Color,
            _ => return None,
        })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Zero value for non-enum types. Enums default to their first variant,
    /// which only the enum definition knows.
    pub fn zero(&self) -> Option<Value> {
        Some(match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Str => Value::Str(String::new()),
            Self::Vec3 => Value::Vec3([0.0; 3]),
            Self::Color => Value::Color([1.0; 4]),
            Self::Enum(_) => return None,
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("string"),
            Self::Vec3 => f.write_str("vec3"),
            Self::Color => f.write_str("color"),
            Self::Enum(name) => f.write_str(name),
        }
    }
}

/// A runtime value held by a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Vec3([f64; 3]),
    Color([f64; 4]),
    Enum { ty: String, variant: String },
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Str(_) => ValueType::Str,
            Self::Vec3(_) => ValueType::Vec3,
            Self::Color(_) => ValueType::Color,
            Self::Enum { ty, .. } => ValueType::Enum(ty.clone()),
        }
    }

    /// Numeric view used by range validation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Vec3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            Self::Color([r, g, b, a]) => write!(f, "({r}, {g}, {b}, {a})"),
            Self::Enum { ty, variant } => {
                let short = ty.rsplit('.').next().unwrap_or(ty);
                write!(f, "{short}.{variant}")
            }
        }
    }
}

/// Plain data member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: ValueType,
    pub default: Value,
}

/// Accessor-backed member. Writes go through range validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub ty: ValueType,
    pub default: Value,
    pub readable: bool,
    pub writable: bool,
    pub range: Option<(f64, f64)>,
}

impl PropertyDef {
    /// Readable and writable: the only properties state migration touches.
    pub fn is_read_write(&self) -> bool {
        self.readable && self.writable
    }

    pub fn in_range(&self, value: &Value) -> bool {
        match (self.range, value.as_f64()) {
            (Some((min, max)), Some(v)) => v >= min && v <= max,
            _ => true,
        }
    }
}

/// A component type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    /// Fully-qualified name (`Game.Player.Mover`).
    pub name: String,
    pub is_abstract: bool,
    pub base: Option<String>,
    /// Base chain, nearest first, ending at the root component type.
    pub ancestors: Vec<String>,
    /// Inherited members first, in declaration order.
    pub fields: Vec<FieldDef>,
    pub properties: Vec<PropertyDef>,
}

impl ComponentDef {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn is_subclass_of(&self, base: &str) -> bool {
        self.ancestors.iter().any(|a| a == base)
    }
}

/// An enum type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub variants: Vec<String>,
}

impl EnumDef {
    pub fn has_variant(&self, variant: &str) -> bool {
        self.variants.iter().any(|v| v == variant)
    }
}

/// Any type a unit can define.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDef {
    Component(ComponentDef),
    Enum(EnumDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            Self::Component(c) => &c.name,
            Self::Enum(e) => &e.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_keywords() {
        assert_eq!(ValueType::from_keyword("float"), Some(ValueType::Float));
        assert_eq!(ValueType::from_keyword("string"), Some(ValueType::Str));
        assert_eq!(ValueType::from_keyword("Team"), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Float(5.0).to_string(), "5");
        assert_eq!(Value::Vec3([0.0, 1.0, 2.5]).to_string(), "(0, 1, 2.5)");
        let team = Value::Enum {
            ty: "Game.Team".into(),
            variant: "Red".into(),
        };
        assert_eq!(team.to_string(), "Team.Red");
        assert_eq!(team.value_type(), ValueType::Enum("Game.Team".into()));
    }

    #[test]
    fn test_property_range() {
        let prop = PropertyDef {
            name: "health".into(),
            ty: ValueType::Int,
            default: Value::Int(100),
            readable: true,
            writable: true,
            range: Some((0.0, 100.0)),
        };
        assert!(prop.in_range(&Value::Int(50)));
        assert!(!prop.in_range(&Value::Int(101)));
        assert!(prop.is_read_write());
    }
}
