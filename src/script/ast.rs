//! Syntax tree of a script file.

use super::diagnostic::Span;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Component(ComponentDecl),
    Enum(EnumDecl),
}

impl Item {
    pub fn qualified_name(&self) -> String {
        match self {
            Self::Component(c) => qualify(c.namespace.as_deref(), &c.name),
            Self::Enum(e) => qualify(e.namespace.as_deref(), &e.name),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Component(c) => c.span,
            Self::Enum(e) => e.span,
        }
    }
}

pub fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}.{name}"),
        None => name.to_string(),
    }
}

/// A possibly dotted name: `Behaviour`, `Game.Team`, `Team.Red`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRef {
    pub segments: Vec<String>,
    pub span: Span,
}

impl PathRef {
    pub fn joined(&self) -> String {
        self.segments.join(".")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDecl {
    pub name: String,
    pub namespace: Option<String>,
    pub is_abstract: bool,
    pub base: Option<PathRef>,
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub namespace: Option<String>,
    pub variants: Vec<(String, Span)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberDecl {
    pub name: String,
    pub ty: PathRef,
    pub default: Option<LiteralExpr>,
    pub kind: MemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    Field,
    Property {
        get: bool,
        set: bool,
        range: Option<(f64, f64)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// `(x, y, z)` or `(r, g, b, a)`.
    Tuple(Vec<f64>),
    /// Enum variant reference.
    Path(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub literal: Literal,
    pub span: Span,
}
