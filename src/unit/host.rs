//! The engine-core unit every script generation is compiled against.

use super::{
    TypeHandle, Unit, UnitOrigin,
    types::{ComponentDef, FieldDef, PropertyDef, TypeDef, Value, ValueType},
};
use std::sync::Arc;

pub const TRANSFORM: &str = "Transform";
pub const COMPONENT: &str = "Component";
pub const BEHAVIOUR: &str = "Behaviour";
pub const CORE_UNIT_NAME: &str = "Engine.Core";

/// Component slot of `Transform` in the core unit: `builtin_types` lists
/// `Component` then `Transform`, and extras never replace a builtin.
const TRANSFORM_SLOT: usize = 1;

/// Immortal core unit plus lookup helpers used by the compiler and the scene.
#[derive(Debug, Clone)]
pub struct HostSurface {
    unit: Arc<Unit>,
}

impl HostSurface {
    /// Built-in engine types only.
    pub fn engine_core() -> Self {
        Self::with_types(Vec::new())
    }

    /// Built-in types plus host-registered extras. Extras declaring a `base`
    /// get their ancestor chain and inherited members filled in here.
    pub fn with_types(extra: Vec<TypeDef>) -> Self {
        let mut types = builtin_types();
        for def in extra {
            if types.iter().any(|t| t.name() == def.name()) {
                continue;
            }
            types.push(def);
        }
        link_inheritance(&mut types);
        Self {
            unit: Unit::from_types(CORE_UNIT_NAME, UnitOrigin::Core, types),
        }
    }

    pub fn unit(&self) -> &Arc<Unit> {
        &self.unit
    }

    pub fn component(&self, name: &str) -> Option<&ComponentDef> {
        self.unit.component(name)
    }

    pub fn handle(&self, name: &str) -> Option<TypeHandle> {
        TypeHandle::resolve(&self.unit, name)
    }

    /// The spatial transform type.
    pub fn transform(&self) -> TypeHandle {
        TypeHandle {
            unit: Arc::clone(&self.unit),
            index: TRANSFORM_SLOT,
        }
    }

    /// Concrete core types a user may attach (everything but the transform).
    pub fn addable_types(&self) -> impl Iterator<Item = &ComponentDef> {
        self.unit.component_types().filter(|c| c.name != TRANSFORM)
    }
}

impl Default for HostSurface {
    fn default() -> Self {
        Self::engine_core()
    }
}

fn field(name: &str, ty: ValueType, default: Value) -> FieldDef {
    FieldDef {
        name: name.into(),
        ty,
        default,
    }
}

fn component(name: &str, base: Option<&str>, is_abstract: bool, fields: Vec<FieldDef>) -> TypeDef {
    TypeDef::Component(ComponentDef {
        name: name.into(),
        is_abstract,
        base: base.map(Into::into),
        ancestors: Vec::new(),
        fields,
        properties: Vec::new(),
    })
}

fn builtin_types() -> Vec<TypeDef> {
    use Value as V;
    use ValueType as T;

    let behaviour = Some(BEHAVIOUR);
    let mut audio_source = component(
        "AudioSource",
        behaviour,
        false,
        vec![
            field("clip", T::Str, V::Str(String::new())),
            field("pitch", T::Float, V::Float(1.0)),
            field("looping", T::Bool, V::Bool(false)),
        ],
    );
    if let TypeDef::Component(c) = &mut audio_source {
        c.properties.push(PropertyDef {
            name: "volume".into(),
            ty: T::Float,
            default: V::Float(1.0),
            readable: true,
            writable: true,
            range: Some((0.0, 1.0)),
        });
    }

    vec![
        component(COMPONENT, None, true, Vec::new()),
        component(
            TRANSFORM,
            Some(COMPONENT),
            false,
            vec![
                field("position", T::Vec3, V::Vec3([0.0; 3])),
                field("rotation", T::Vec3, V::Vec3([0.0; 3])),
                field("scale", T::Vec3, V::Vec3([1.0; 3])),
            ],
        ),
        component(
            BEHAVIOUR,
            Some(COMPONENT),
            true,
            vec![
                field("enabled", T::Bool, V::Bool(true)),
                field("has_started", T::Bool, V::Bool(false)),
            ],
        ),
        component(
            "Camera",
            behaviour,
            false,
            vec![
                field("field_of_view", T::Float, V::Float(75.0)),
                field("near_plane", T::Float, V::Float(0.1)),
                field("far_plane", T::Float, V::Float(1000.0)),
                field("depth", T::Float, V::Float(0.0)),
            ],
        ),
        audio_source,
        component("AudioListener", behaviour, false, Vec::new()),
        component(
            "MeshRenderer",
            behaviour,
            false,
            vec![
                field("mesh", T::Str, V::Str(String::new())),
                field("tint", T::Color, V::Color([1.0; 4])),
            ],
        ),
    ]
}

/// Resolve ancestors and prepend inherited members, bases first.
fn link_inheritance(types: &mut [TypeDef]) {
    let snapshot: Vec<ComponentDef> = types
        .iter()
        .filter_map(|t| match t {
            TypeDef::Component(c) => Some(c.clone()),
            TypeDef::Enum(_) => None,
        })
        .collect();
    let lookup = |name: &str| snapshot.iter().find(|c| c.name == name);

    for def in types.iter_mut() {
        let TypeDef::Component(c) = def else { continue };

        let mut chain = Vec::new();
        let mut next = c.base.clone();
        while let Some(name) = next {
            if chain.contains(&name) || name == c.name {
                break;
            }
            next = lookup(&name).and_then(|b| b.base.clone());
            chain.push(name);
        }

        let mut fields = Vec::new();
        let mut properties = Vec::new();
        for base in chain.iter().rev().filter_map(|n| lookup(n)) {
            fields.extend(base.fields.iter().cloned());
            properties.extend(base.properties.iter().cloned());
        }
        fields.append(&mut c.fields);
        properties.append(&mut c.properties);

        c.fields = fields;
        c.properties = properties;
        c.ancestors = chain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_present() {
        let host = HostSurface::engine_core();
        let transform = host.component(TRANSFORM).unwrap();
        assert_eq!(transform.ancestors, vec![COMPONENT.to_string()]);
        assert_eq!(transform.field("scale").unwrap().default, Value::Vec3([1.0; 3]));

        let camera = host.component("Camera").unwrap();
        assert_eq!(camera.ancestors, vec![BEHAVIOUR.to_string(), COMPONENT.to_string()]);
        assert_eq!(camera.fields[0].name, "enabled");
        assert!(host.component(BEHAVIOUR).unwrap().is_abstract);
    }

    #[test]
    fn test_transform_slot() {
        let host = HostSurface::with_types(vec![component("Extra", Some(COMPONENT), false, Vec::new())]);
        assert_eq!(host.transform().name(), TRANSFORM);
        assert!(host.transform().same_type(&host.handle(TRANSFORM).unwrap()));
    }

    #[test]
    fn test_addable_types_exclude_transform_and_abstract() {
        let host = HostSurface::engine_core();
        let names: Vec<_> = host.addable_types().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"Camera"));
        assert!(!names.contains(&TRANSFORM));
        assert!(!names.contains(&BEHAVIOUR));
        assert!(!names.contains(&COMPONENT));
    }

    #[test]
    fn test_extra_types_inherit() {
        let host = HostSurface::with_types(vec![TypeDef::Component(ComponentDef {
            name: "Light".into(),
            is_abstract: false,
            base: Some(BEHAVIOUR.into()),
            ancestors: Vec::new(),
            fields: vec![field("intensity", ValueType::Float, Value::Float(1.0))],
            properties: Vec::new(),
        })]);
        let light = host.component("Light").unwrap();
        assert!(light.is_subclass_of(BEHAVIOUR));
        let names: Vec<_> = light.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["enabled", "has_started", "intensity"]);
    }
}
