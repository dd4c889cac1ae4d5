//! Inspector query: the component types a user can add to an object.

use super::common::{compile_project, open_compiler};
use crate::config::ProjectConfig;
use crate::log;
use anyhow::{Result, bail};

/// Compile the project and return the addable types, core types first.
pub fn list_types(config: &ProjectConfig) -> Result<Vec<String>> {
    let mut compiler = open_compiler(config);
    if let Some(result) = compile_project(config, &mut compiler)
        && !result.is_success()
    {
        bail!("compilation failed, script types unavailable");
    }
    Ok(compiler.addable_component_types())
}

pub fn print_types(config: &ProjectConfig) -> Result<()> {
    let types = list_types(config)?;
    log!("types"; "{} addable component types", types.len());
    for name in types {
        println!("{name}");
    }
    Ok(())
}
