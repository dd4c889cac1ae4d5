//! Script front-end: source text to a unit image.
//!
//! ```text
//! read_sources ─► parse (per file) ─► check (whole set) ─► UnitImage
//! ```
//!
//! Each generation is checked against the host surface and itself only;
//! types of earlier generations are never visible.

mod ast;
mod check;
mod diagnostic;
mod lexer;
mod parser;

pub use diagnostic::{Diagnostic, Severity, Span, has_errors};

use crate::unit::{HostSurface, TypeDef, UnitImage};
use crate::utils::plural::plural_count;
use rayon::prelude::*;
use std::{fs, path::PathBuf};

/// Result of one front-end run. `image` is `None` whenever an error
/// diagnostic was produced.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub image: Option<UnitImage>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn succeeded(&self) -> bool {
        self.image.is_some()
    }

    fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            image: None,
            diagnostics,
        }
    }
}

/// Read every script as UTF-8. Unreadable files become error diagnostics.
pub fn read_sources(paths: &[PathBuf]) -> (Vec<(PathBuf, String)>, Vec<Diagnostic>) {
    let results: Vec<_> = paths
        .par_iter()
        .map(|path| (path.clone(), fs::read_to_string(path)))
        .collect();

    let mut sources = Vec::with_capacity(results.len());
    let mut diagnostics = Vec::new();
    for (path, result) in results {
        match result {
            Ok(text) => sources.push((path, text)),
            Err(e) => diagnostics.push(Diagnostic::error(format!("cannot read script: {e}")).in_file(path)),
        }
    }
    (sources, diagnostics)
}

/// Compile `sources` into a unit image named `name`.
pub fn compile_sources(name: &str, sources: &[(PathBuf, String)], host: &HostSurface) -> Compilation {
    if sources.is_empty() {
        return Compilation::failed(vec![Diagnostic::error("no scripts provided")]);
    }

    let parsed: Vec<_> = sources
        .par_iter()
        .map(|(path, text)| parser::parse(path, text).map_err(|d| d.in_file(path)))
        .collect();

    let mut files = Vec::with_capacity(parsed.len());
    let mut diagnostics = Vec::new();
    for result in parsed {
        match result {
            Ok(file) => files.push(file),
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
    }
    // Checking a partial set would only report follow-up errors.
    if !diagnostics.is_empty() {
        return Compilation::failed(diagnostics);
    }

    let (types, mut semantic) = check::check(&files, host);
    diagnostics.append(&mut semantic);
    if has_errors(&diagnostics) {
        return Compilation::failed(diagnostics);
    }

    diagnostics.push(Diagnostic::info(format!(
        "compiled {} from {}",
        plural_count(types.len(), "type"),
        plural_count(files.len(), "file")
    )));

    Compilation {
        image: Some(UnitImage::new(name, types)),
        diagnostics,
    }
}

/// Names of component types in an image, for log lines.
pub fn component_names(image: &UnitImage) -> Vec<&str> {
    image
        .types
        .iter()
        .filter_map(|t| match t {
            TypeDef::Component(c) => Some(c.name.as_str()),
            TypeDef::Enum(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn src(path: &str, text: &str) -> (PathBuf, String) {
        (PathBuf::from(path), text.to_string())
    }

    #[test]
    fn test_compile_success_reports_summary() {
        let host = HostSurface::engine_core();
        let result = compile_sources(
            "ScriptAssembly_TEST",
            &[
                src("a.nes", "component Foo : Behaviour { speed: float = 5; }"),
                src("b.nes", "enum Team { Red }"),
            ],
            &host,
        );
        assert!(result.succeeded());
        let image = result.image.unwrap();
        assert_eq!(image.name, "ScriptAssembly_TEST");
        assert_eq!(component_names(&image), vec!["Foo"]);
        let info = result.diagnostics.last().unwrap();
        assert_eq!(info.severity, Severity::Info);
        assert_eq!(info.message, "compiled 2 types from 2 files");
    }

    #[test]
    fn test_syntax_error_blocks_image() {
        let host = HostSurface::engine_core();
        let result = compile_sources(
            "X",
            &[src("a.nes", "component Foo {"), src("b.nes", "component Bar { x: int; }")],
            &host,
        );
        assert!(!result.succeeded());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].file.as_deref(), Some(Path::new("a.nes")));
    }

    #[test]
    fn test_empty_set_fails() {
        let result = compile_sources("X", &[], &HostSurface::engine_core());
        assert!(!result.succeeded());
        assert!(has_errors(&result.diagnostics));
    }

    #[test]
    fn test_read_sources_reports_missing() {
        let dir = TempDir::new().unwrap();
        let ok = dir.path().join("A.nes");
        fs::write(&ok, "enum E { A }").unwrap();
        let missing = dir.path().join("Gone.nes");

        let (sources, diagnostics) = read_sources(&[ok.clone(), missing.clone()]);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].0, ok);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].file.as_ref(), Some(&missing));
    }
}
