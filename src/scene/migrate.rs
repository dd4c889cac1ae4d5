//! State migration across a unit swap.
//!
//! Every script-defined component is rebuilt from the same-named type of
//! the new unit. Values carry over when name and declared type match on
//! both sides; anything else keeps the new default.

use super::{
    component::{ComponentError, ComponentInstance},
    registry::ObjectRegistry,
};
use crate::logger::Console;
use crate::unit::{HostSurface, TRANSFORM, TypeHandle, Unit, UnitOrigin, Value, ValueType};
use std::sync::Arc;

/// Counters of one [`reload_all`] sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Instances replaced by a new-unit instance.
    pub migrated: usize,
    /// Instances with no counterpart, left untouched.
    pub orphaned: usize,
    /// Instances whose new type could not be constructed.
    pub failed: usize,
    /// Individual values that could not be carried over.
    pub dropped_values: usize,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned == 0 && self.failed == 0
    }
}

/// Rebuild `old` as an instance of `target`, carrying over compatible state.
/// Enum types resolve against the target's unit, then `host`.
/// Returns the new instance and the names of members whose value was dropped.
pub fn migrate_instance(
    old: &ComponentInstance,
    target: TypeHandle,
    host: &HostSurface,
) -> Result<(ComponentInstance, Vec<String>), ComponentError> {
    let unit = Arc::clone(target.unit());
    let mut new = ComponentInstance::new(target)?;
    let mut dropped = Vec::new();

    let new_def = new.def().clone();
    let old_def = old.def();

    for field in &new_def.fields {
        let Some(old_field) = old_def.field(&field.name) else { continue };
        if old_field.ty != field.ty {
            continue;
        }
        let Some(value) = old.field(&field.name) else { continue };
        if !variant_exists(&unit, host, &field.ty, value) {
            dropped.push(field.name.clone());
            continue;
        }
        if new.set_field(&field.name, value.clone()).is_err() {
            dropped.push(field.name.clone());
        }
    }

    for prop in new_def.properties.iter().filter(|p| p.is_read_write()) {
        let Some(old_prop) = old_def.property(&prop.name) else { continue };
        if !old_prop.is_read_write() || old_prop.ty != prop.ty {
            continue;
        }
        let Ok(value) = old.property(&prop.name) else { continue };
        if !variant_exists(&unit, host, &prop.ty, value) {
            dropped.push(prop.name.clone());
            continue;
        }
        if let Err(e) = new.set_property(&prop.name, value.clone()) {
            crate::debug!("reload"; "{}.{}: {}", new_def.name, prop.name, e);
            dropped.push(prop.name.clone());
        }
    }

    Ok((new, dropped))
}

/// Enum values only carry over when the variant still exists.
fn variant_exists(unit: &Unit, host: &HostSurface, ty: &ValueType, value: &Value) -> bool {
    match (ty, value) {
        (ValueType::Enum(name), Value::Enum { variant, .. }) => unit
            .enum_def(name)
            .or_else(|| host.unit().enum_def(name))
            .is_some_and(|e| e.has_variant(variant)),
        _ => true,
    }
}

/// Migrate every registered object to `unit`.
///
/// Per-instance problems are logged to `console` and counted; the sweep
/// always runs to the end.
pub fn reload_all(
    registry: &ObjectRegistry,
    unit: &Arc<Unit>,
    host: &HostSurface,
    console: &Console,
) -> MigrationReport {
    let mut report = MigrationReport::default();

    for handle in registry.live() {
        let mut object = handle.lock();
        for index in 0..object.components().len() {
            let old = &object.components()[index];
            if old.type_name() == TRANSFORM
                || old.origin() == UnitOrigin::Core
                || old.unit_id() == unit.id()
            {
                continue;
            }

            let type_name = old.type_name().to_string();
            let Some(target) = TypeHandle::resolve(unit, &type_name) else {
                console.editor_warning(format!(
                    "[HotReload] `{type_name}` on '{}' has no counterpart in {}; keeping the stale instance",
                    object.name,
                    unit.name()
                ));
                report.orphaned += 1;
                continue;
            };

            match migrate_instance(old, target, host) {
                Ok((new, dropped)) => {
                    if !dropped.is_empty() {
                        report.dropped_values += dropped.len();
                        console.editor_log(format!(
                            "[HotReload] `{type_name}` on '{}': reset {}",
                            object.name,
                            dropped.join(", ")
                        ));
                    }
                    object.replace_component(index, new);
                    report.migrated += 1;
                }
                Err(e) => {
                    console.editor_error(format!(
                        "[HotReload] cannot rebuild `{type_name}` on '{}': {e}",
                        object.name
                    ));
                    report.failed += 1;
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogLevel;
    use crate::script::compile_sources;
    use crate::unit::{EnumDef, TypeDef};
    use std::path::PathBuf;

    fn build(host: &HostSurface, source: &str) -> Arc<Unit> {
        let result = compile_sources("ScriptAssembly_T", &[(PathBuf::from("a.nes"), source.into())], host);
        let image = result.image.unwrap_or_else(|| panic!("{:?}", result.diagnostics));
        Unit::from_image(image, UnitOrigin::Script)
    }

    fn attach(registry: &ObjectRegistry, host: &HostSurface, unit: &Arc<Unit>, name: &str, ty: &str) -> crate::scene::ObjectHandle {
        let obj = registry.spawn(name, host);
        obj.lock()
            .add_component(TypeHandle::resolve(unit, ty).unwrap())
            .unwrap();
        obj
    }

    #[test]
    fn test_field_survives_reload() {
        let host = HostSurface::engine_core();
        let registry = ObjectRegistry::new();
        let console = Console::new();

        let v1 = build(&host, "component Foo : Behaviour { speed: float = 5; }");
        let player = attach(&registry, &host, &v1, "Player", "Foo");
        player
            .lock()
            .get_component_mut("Foo")
            .unwrap()
            .set_field("speed", Value::Float(9.0))
            .unwrap();
        let old_id = player.lock().components()[1].id();

        let v2 = build(&host, "component Foo : Behaviour { speed: float = 5; jump: int = 2; }");
        let report = reload_all(&registry, &v2, &host, &console);
        assert_eq!(report.migrated, 1);
        assert!(report.is_clean());

        let obj = player.lock();
        let foo = &obj.components()[1];
        assert_ne!(foo.id(), old_id);
        assert_eq!(foo.unit_id(), v2.id());
        assert_eq!(foo.field("speed"), Some(&Value::Float(9.0)));
        assert_eq!(foo.field("jump"), Some(&Value::Int(2)));
        assert_eq!(obj.components()[0].type_name(), TRANSFORM);
    }

    #[test]
    fn test_reload_releases_old_unit() {
        let host = HostSurface::engine_core();
        let registry = ObjectRegistry::new();
        let v1 = build(&host, "component Foo { x: int; }");
        let _obj = attach(&registry, &host, &v1, "A", "Foo");
        let witness = Arc::downgrade(&v1);
        drop(v1);
        assert!(witness.strong_count() > 0);

        let v2 = build(&host, "component Foo { x: int; }");
        reload_all(&registry, &v2, &host, &Console::new());
        assert_eq!(witness.strong_count(), 0);
    }

    #[test]
    fn test_missing_type_is_orphaned() {
        let host = HostSurface::engine_core();
        let registry = ObjectRegistry::new();
        let console = Console::new();
        let v1 = build(&host, "component Foo { x: int = 1; }\ncomponent Bar { y: int; }");
        let obj = attach(&registry, &host, &v1, "Player", "Foo");
        let before = obj.lock().components()[1].id();

        let v2 = build(&host, "component Bar { y: int; }");
        let report = reload_all(&registry, &v2, &host, &console);
        assert_eq!(report.orphaned, 1);
        assert_eq!(obj.lock().components()[1].id(), before);
        assert_eq!(obj.lock().components()[1].unit_id(), v1.id());
        assert!(console.contains(LogLevel::Warn, "no counterpart"));
    }

    #[test]
    fn test_type_change_and_missing_variant_reset() {
        let host = HostSurface::engine_core();
        let registry = ObjectRegistry::new();
        let v1 = build(
            &host,
            "enum Team { Red, Blue }\ncomponent Foo { a: int = 1; team: Team = Team.Blue; prop hp: int = 10 { get; set; } }",
        );
        let obj = attach(&registry, &host, &v1, "P", "Foo");
        {
            let mut o = obj.lock();
            let foo = o.get_component_mut("Foo").unwrap();
            foo.set_field("a", Value::Int(7)).unwrap();
            foo.set_property("hp", Value::Int(80)).unwrap();
        }

        let v2 = build(
            &host,
            "enum Team { Red }\ncomponent Foo { a: float = 0.5; team: Team; prop hp: int = 10 { get; set; range(0, 50) } }",
        );
        let report = reload_all(&registry, &v2, &host, &Console::new());
        assert_eq!(report.migrated, 1);
        assert_eq!(report.dropped_values, 2);

        let o = obj.lock();
        let foo = o.get_component("Foo").unwrap();
        assert_eq!(foo.field("a"), Some(&Value::Float(0.5)));
        assert_eq!(
            foo.field("team"),
            Some(&Value::Enum {
                ty: "Team".into(),
                variant: "Red".into()
            })
        );
        assert_eq!(foo.property("hp"), Ok(&Value::Int(10)));
    }

    #[test]
    fn test_abstract_target_fails_without_aborting() {
        let host = HostSurface::engine_core();
        let registry = ObjectRegistry::new();
        let console = Console::new();
        let v1 = build(&host, "component Foo { x: int; }\ncomponent Bar { y: int = 4; }");
        let a = attach(&registry, &host, &v1, "A", "Foo");
        let b = attach(&registry, &host, &v1, "B", "Bar");
        b.lock()
            .get_component_mut("Bar")
            .unwrap()
            .set_field("y", Value::Int(8))
            .unwrap();

        let v2 = build(&host, "abstract component Foo { x: int; }\ncomponent Bar { y: int; }");
        let report = reload_all(&registry, &v2, &host, &console);
        assert_eq!(report.failed, 1);
        assert_eq!(report.migrated, 1);
        assert_eq!(a.lock().components()[1].unit_id(), v1.id());
        assert_eq!(b.lock().get_component("Bar").unwrap().field("y"), Some(&Value::Int(8)));
        assert_eq!(console.count(LogLevel::Error), 1);
    }

    #[test]
    fn test_core_components_untouched() {
        let host = HostSurface::engine_core();
        let registry = ObjectRegistry::new();
        let cam = registry.spawn("Cam", &host);
        cam.lock().add_component(host.handle("Camera").unwrap()).unwrap();
        let before: Vec<_> = cam.lock().components().iter().map(|c| c.id()).collect();

        let v1 = build(&host, "component Foo { x: int; }");
        let report = reload_all(&registry, &v1, &host, &Console::new());
        assert_eq!(report, MigrationReport::default());
        let after: Vec<_> = cam.lock().components().iter().map(|c| c.id()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_host_enum_value_survives_reload() {
        let host = HostSurface::with_types(vec![TypeDef::Enum(EnumDef {
            name: "Layer".into(),
            variants: vec!["Default".into(), "Ui".into()],
        })]);
        let registry = ObjectRegistry::new();
        let source = "component Foo { layer: Layer = Layer.Default; }";
        let ui = Value::Enum {
            ty: "Layer".into(),
            variant: "Ui".into(),
        };

        let v1 = build(&host, source);
        let obj = attach(&registry, &host, &v1, "P", "Foo");
        obj.lock()
            .get_component_mut("Foo")
            .unwrap()
            .set_field("layer", ui.clone())
            .unwrap();

        let v2 = build(&host, source);
        let report = reload_all(&registry, &v2, &host, &Console::new());
        assert_eq!(report.migrated, 1);
        assert_eq!(report.dropped_values, 0);

        let o = obj.lock();
        let foo = o.get_component("Foo").unwrap();
        assert_eq!(foo.unit_id(), v2.id());
        assert_eq!(foo.field("layer"), Some(&ui));
    }
}
