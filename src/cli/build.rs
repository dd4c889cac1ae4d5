//! One-shot compile of every script in a project.

use super::common::{compile_project, open_compiler};
use crate::compiler::CompileResult;
use crate::config::ProjectConfig;
use crate::log;
use crate::utils::plural::plural_count;
use anyhow::Result;

/// Compile the project and report the outcome. Returns whether the build
/// succeeded; an empty project counts as success.
pub fn build_project(config: &ProjectConfig) -> Result<bool> {
    let mut compiler = open_compiler(config);
    let Some(result) = compile_project(config, &mut compiler) else {
        return Ok(true);
    };

    match &result {
        CompileResult::Compiled(unit) => log!(
            "compile";
            "built {} ({})",
            unit.name(),
            plural_count(unit.type_count(), "type")
        ),
        CompileResult::Cached(unit) => log!("compile"; "{} is up to date", unit.name()),
        CompileResult::Failed(diagnostics) => {
            let errors = diagnostics.iter().filter(|d| d.is_error()).count();
            log!("error"; "build failed with {}", plural_count(errors, "error"));
        }
    }
    Ok(result.is_success())
}
