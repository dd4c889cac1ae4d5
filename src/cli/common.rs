//! Helpers shared across CLI commands.

use crate::actor::Project;
use crate::compiler::{CompileResult, ScriptCompiler};
use crate::config::ProjectConfig;
use crate::logger::Console;
use crate::log;
use crate::utils::plural::plural_count;

/// A compiler for `config`'s project that echoes its console to the terminal.
pub fn open_compiler(config: &ProjectConfig) -> ScriptCompiler {
    ScriptCompiler::new(config.artifact_store(), Console::new().with_echo(true))
        .with_options(config.compiler.options())
}

/// Compile every script of `config`'s project once.
///
/// Returns `None` when there is nothing to compile.
pub fn compile_project(config: &ProjectConfig, compiler: &mut ScriptCompiler) -> Option<CompileResult> {
    let project = Project::from_config(config);
    let paths = project.script_paths();
    if paths.is_empty() {
        log!(
            "compile";
            "no .{} scripts under {}",
            project.extension(),
            project.script_root().display()
        );
        return None;
    }

    crate::debug!("compile"; "compiling {}", plural_count(paths.len(), "script"));
    Some(compiler.compile(&paths))
}
