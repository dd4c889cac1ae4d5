//! Semantic analysis: name resolution, inheritance and default values.
//!
//! Produces the linked type table of a unit. Every problem becomes a
//! [`Diagnostic`]; the caller decides whether errors block the build.

use super::{
    ast::{ComponentDecl, EnumDecl, Item, Literal, LiteralExpr, MemberDecl, MemberKind, PathRef, SourceFile, qualify},
    diagnostic::Diagnostic,
};
use crate::unit::{
    COMPONENT, ComponentDef, EnumDef, FieldDef, HostSurface, PropertyDef, TypeDef, Value, ValueType,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;

/// Check parsed files against `host`. Returns types in declaration order.
pub fn check(files: &[SourceFile], host: &HostSurface) -> (Vec<TypeDef>, Vec<Diagnostic>) {
    let mut checker = Checker::new(host);
    checker.collect(files);
    checker.build_enums();
    let types = checker.build_components();
    (types, checker.diagnostics)
}

struct Decl<'a> {
    item: &'a Item,
    file: &'a Path,
}

enum Resolved {
    Component(String),
    Enum(String),
}

struct Checker<'a> {
    host: &'a HostSurface,
    decls: FxHashMap<String, Decl<'a>>,
    order: Vec<String>,
    enums: FxHashMap<String, EnumDef>,
    linked: FxHashMap<String, Option<ComponentDef>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn new(host: &'a HostSurface) -> Self {
        Self {
            host,
            decls: FxHashMap::default(),
            order: Vec::new(),
            enums: FxHashMap::default(),
            linked: FxHashMap::default(),
            diagnostics: Vec::new(),
        }
    }

    fn error(&mut self, file: &Path, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic.in_file(file));
    }

    fn collect(&mut self, files: &'a [SourceFile]) {
        for file in files {
            for item in &file.items {
                let name = item.qualified_name();
                if let Some(first) = self.decls.get(&name) {
                    let message = format!(
                        "duplicate type `{name}` (first declared in {})",
                        first.file.display()
                    );
                    self.error(&file.path, Diagnostic::error(message).at(item.span()));
                    continue;
                }
                self.order.push(name.clone());
                self.decls.insert(name, Decl { item, file: &file.path });
            }
        }
    }

    /// Unit types first (qualified, then namespace-relative), host last.
    fn resolve(&self, path: &PathRef, namespace: Option<&str>) -> Option<Resolved> {
        let joined = path.joined();
        let mut candidates = vec![joined.clone()];
        if let Some(ns) = namespace {
            candidates.push(qualify(Some(ns), &joined));
        }

        for name in &candidates {
            match self.decls.get(name).map(|d| d.item) {
                Some(Item::Component(_)) => return Some(Resolved::Component(name.clone())),
                Some(Item::Enum(_)) => return Some(Resolved::Enum(name.clone())),
                None => {}
            }
        }

        let unit = self.host.unit();
        if unit.component(&joined).is_some() {
            Some(Resolved::Component(joined))
        } else if unit.enum_def(&joined).is_some() {
            Some(Resolved::Enum(joined))
        } else {
            None
        }
    }

    fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums
            .get(name)
            .or_else(|| self.host.unit().enum_def(name))
    }

    fn build_enums(&mut self) {
        let enums: Vec<(&'a EnumDecl, &'a Path)> = self
            .order
            .iter()
            .filter_map(|name| {
                let decl = self.decls.get(name)?;
                match decl.item {
                    Item::Enum(e) => Some((e, decl.file)),
                    Item::Component(_) => None,
                }
            })
            .collect();

        for (decl, file) in enums {
            let name = qualify(decl.namespace.as_deref(), &decl.name);
            if decl.variants.is_empty() {
                self.error(
                    file,
                    Diagnostic::error(format!("enum `{name}` has no variants")).at(decl.span),
                );
            }

            let mut variants: Vec<String> = Vec::new();
            for (variant, span) in &decl.variants {
                if variants.contains(variant) {
                    self.error(
                        file,
                        Diagnostic::error(format!("duplicate variant `{variant}` in enum `{name}`")).at(*span),
                    );
                    continue;
                }
                variants.push(variant.clone());
            }
            self.enums.insert(name.clone(), EnumDef { name, variants });
        }
    }

    fn build_components(&mut self) -> Vec<TypeDef> {
        let names = self.order.clone();
        let mut types = Vec::new();
        for name in names {
            if let Some(def) = self.enums.get(&name) {
                types.push(TypeDef::Enum(def.clone()));
            } else if let Some(def) = self.link(&name, &mut Vec::new()) {
                types.push(TypeDef::Component(def));
            }
        }
        types
    }

    fn link(&mut self, name: &str, stack: &mut Vec<String>) -> Option<ComponentDef> {
        if let Some(done) = self.linked.get(name) {
            return done.clone();
        }
        let (decl, file): (&'a ComponentDecl, &'a Path) = match self.decls.get(name) {
            Some(d) => match d.item {
                Item::Component(c) => (c, d.file),
                Item::Enum(_) => return None,
            },
            None => return None,
        };

        if let Some(start) = stack.iter().position(|n| n == name) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(name.to_string());
            let message = format!("inheritance cycle: {}", cycle.join(" -> "));
            self.error(file, Diagnostic::error(message).at(decl.span));
            for member in &stack[start..] {
                self.linked.insert(member.clone(), None);
            }
            return None;
        }

        stack.push(name.to_string());
        let base = self.link_base(decl, file, stack);
        stack.pop();

        let def = base.map(|base| self.finish(name, decl, file, base));
        if !self.linked.contains_key(name) {
            self.linked.insert(name.to_string(), def.clone());
        }
        self.linked.get(name).cloned().flatten()
    }

    fn link_base(&mut self, decl: &ComponentDecl, file: &Path, stack: &mut Vec<String>) -> Option<ComponentDef> {
        let Some(base) = &decl.base else {
            return self.host.component(COMPONENT).cloned();
        };

        match self.resolve(base, decl.namespace.as_deref()) {
            Some(Resolved::Component(base_name)) if self.decls.contains_key(&base_name) => {
                self.link(&base_name, stack)
            }
            Some(Resolved::Component(base_name)) => self.host.component(&base_name).cloned(),
            Some(Resolved::Enum(base_name)) => {
                let message = format!("base `{base_name}` of `{}` is not a component", decl.name);
                self.error(file, Diagnostic::error(message).at(base.span));
                None
            }
            None => {
                let message = format!("unknown base type `{}`", base.joined());
                self.error(file, Diagnostic::error(message).at(base.span));
                None
            }
        }
    }

    fn finish(&mut self, name: &str, decl: &ComponentDecl, file: &Path, base: ComponentDef) -> ComponentDef {
        if let Some(host_type) = self.host.component(&decl.name) {
            let message = format!("component `{name}` shadows engine type `{}`", host_type.name);
            self.diagnostics
                .push(Diagnostic::warning(message).at(decl.span).in_file(file));
        }
        if decl.members.is_empty() {
            let message = format!("component `{name}` declares no members");
            self.diagnostics
                .push(Diagnostic::warning(message).at(decl.span).in_file(file));
        }

        let mut ancestors = vec![base.name.clone()];
        ancestors.extend(base.ancestors.iter().cloned());
        let mut fields = base.fields;
        let mut properties = base.properties;

        let mut seen: FxHashSet<String> = fields
            .iter()
            .map(|f| f.name.clone())
            .chain(properties.iter().map(|p| p.name.clone()))
            .collect();

        for member in &decl.members {
            if !seen.insert(member.name.clone()) {
                let message = format!("duplicate member `{}` in `{name}`", member.name);
                self.error(file, Diagnostic::error(message).at(member.span));
                continue;
            }
            let Some((ty, default)) = self.member_type(decl, file, member) else {
                continue;
            };

            match member.kind {
                MemberKind::Field => fields.push(FieldDef {
                    name: member.name.clone(),
                    ty,
                    default,
                }),
                MemberKind::Property { get, set, range } => {
                    if let Some(prop) = self.property(name, file, member, ty, default, (get, set, range)) {
                        properties.push(prop);
                    }
                }
            }
        }

        ComponentDef {
            name: name.to_string(),
            is_abstract: decl.is_abstract,
            base: Some(base.name),
            ancestors,
            fields,
            properties,
        }
    }

    fn property(
        &mut self,
        owner: &str,
        file: &Path,
        member: &MemberDecl,
        ty: ValueType,
        default: Value,
        (get, set, range): (bool, bool, Option<(f64, f64)>),
    ) -> Option<PropertyDef> {
        if !get && !set {
            let message = format!("property `{owner}.{}` has no accessor", member.name);
            self.error(file, Diagnostic::error(message).at(member.span));
            return None;
        }
        if range.is_some() && !ty.is_numeric() {
            let message = format!("`range` on non-numeric property `{owner}.{}` of type `{ty}`", member.name);
            self.error(file, Diagnostic::error(message).at(member.span));
            return None;
        }
        if set && !get {
            let message = format!(
                "property `{owner}.{}` is write-only and will not survive a reload",
                member.name
            );
            self.diagnostics
                .push(Diagnostic::warning(message).at(member.span).in_file(file));
        }

        let prop = PropertyDef {
            name: member.name.clone(),
            ty,
            default,
            readable: get,
            writable: set,
            range,
        };
        if !prop.in_range(&prop.default) {
            let message = format!(
                "default {} of `{owner}.{}` is outside its range",
                prop.default, member.name
            );
            self.diagnostics
                .push(Diagnostic::warning(message).at(member.span).in_file(file));
        }
        Some(prop)
    }

    fn member_type(&mut self, decl: &ComponentDecl, file: &Path, member: &MemberDecl) -> Option<(ValueType, Value)> {
        let ty = match ValueType::from_keyword(&member.ty.joined()) {
            Some(ty) => ty,
            None => match self.resolve(&member.ty, decl.namespace.as_deref()) {
                Some(Resolved::Enum(name)) => ValueType::Enum(name),
                Some(Resolved::Component(name)) => {
                    let message = format!("member `{}` cannot hold component type `{name}`", member.name);
                    self.error(file, Diagnostic::error(message).at(member.ty.span));
                    return None;
                }
                None => {
                    let message = format!("unknown type `{}`", member.ty.joined());
                    self.error(file, Diagnostic::error(message).at(member.ty.span));
                    return None;
                }
            },
        };

        let default = match &member.default {
            Some(literal) => match self.literal_value(literal, &ty, decl.namespace.as_deref()) {
                Ok(value) => value,
                Err(message) => {
                    self.error(file, Diagnostic::error(message).at(literal.span));
                    return None;
                }
            },
            None => self.zero(&ty)?,
        };
        Some((ty, default))
    }

    fn zero(&self, ty: &ValueType) -> Option<Value> {
        match ty {
            ValueType::Enum(name) => {
                let variant = self.enum_def(name)?.variants.first()?.clone();
                Some(Value::Enum {
                    ty: name.clone(),
                    variant,
                })
            }
            other => other.zero(),
        }
    }

    fn literal_value(&self, expr: &LiteralExpr, ty: &ValueType, namespace: Option<&str>) -> Result<Value, String> {
        let mismatch = || format!("default value does not match type `{ty}`");
        match (ty, &expr.literal) {
            (ValueType::Bool, Literal::Bool(v)) => Ok(Value::Bool(*v)),
            (ValueType::Int, Literal::Int(v)) => Ok(Value::Int(*v)),
            (ValueType::Float, Literal::Int(v)) => Ok(Value::Float(*v as f64)),
            (ValueType::Float, Literal::Float(v)) => Ok(Value::Float(*v)),
            (ValueType::Str, Literal::Str(v)) => Ok(Value::Str(v.clone())),
            (ValueType::Vec3, Literal::Tuple(v)) if v.len() == 3 => Ok(Value::Vec3([v[0], v[1], v[2]])),
            (ValueType::Color, Literal::Tuple(v)) if v.len() == 3 => Ok(Value::Color([v[0], v[1], v[2], 1.0])),
            (ValueType::Color, Literal::Tuple(v)) if v.len() == 4 => Ok(Value::Color([v[0], v[1], v[2], v[3]])),
            (ValueType::Enum(name), Literal::Path(segments)) => {
                let Some((variant, prefix)) = segments.split_last() else {
                    return Err(mismatch());
                };
                if !prefix.is_empty() {
                    let path = PathRef {
                        segments: prefix.to_vec(),
                        span: expr.span,
                    };
                    match self.resolve(&path, namespace) {
                        Some(Resolved::Enum(resolved)) if resolved == *name => {}
                        _ => return Err(mismatch()),
                    }
                }
                let def = self.enum_def(name).ok_or_else(mismatch)?;
                if !def.has_variant(variant) {
                    return Err(format!("enum `{name}` has no variant `{variant}`"));
                }
                Ok(Value::Enum {
                    ty: name.clone(),
                    variant: variant.clone(),
                })
            }
            _ => Err(mismatch()),
        }
    }
}
