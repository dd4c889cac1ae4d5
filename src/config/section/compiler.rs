//! `[compiler]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compiler]
//! artifact_dir = "obj/NetEngine_ScriptCompilerAssemblies"
//! debug_copies = true         # Persist <unit>_<timestamp> copies
//! keep_debug_copies = 8       # Newest copies kept per unit (0 = keep all)
//! persist_diagnostics = true  # Write diagnostics.json next to the artifacts
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::compiler::{ARTIFACT_DIR_NAME, CompilerOptions};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub artifact_dir: PathBuf,
    pub debug_copies: bool,
    pub keep_debug_copies: usize,
    pub persist_diagnostics: bool,
}

impl CompilerConfig {
    pub const ARTIFACT_DIR: FieldPath = FieldPath::new("compiler.artifact_dir");

    pub fn options(&self) -> CompilerOptions {
        CompilerOptions {
            debug_copies: self.debug_copies,
            persist_diagnostics: self.persist_diagnostics,
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.artifact_dir.as_os_str().is_empty() {
            diag.error(Self::ARTIFACT_DIR, "must not be empty");
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("obj").join(ARTIFACT_DIR_NAME),
            debug_copies: true,
            keep_debug_copies: 8,
            persist_diagnostics: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_compiler_config() {
        let config = test_parse_config(
            "[compiler]\nartifact_dir = \"build/units\"\ndebug_copies = false\nkeep_debug_copies = 0",
        );
        assert_eq!(config.compiler.artifact_dir.to_str(), Some("build/units"));
        assert!(!config.compiler.options().debug_copies);
        assert!(config.compiler.options().persist_diagnostics);
        assert_eq!(config.compiler.keep_debug_copies, 0);
    }

    #[test]
    fn test_compiler_config_defaults() {
        let config = test_parse_config("");
        assert!(config.compiler.artifact_dir.ends_with("NetEngine_ScriptCompilerAssemblies"));
        assert!(config.compiler.debug_copies);
        assert_eq!(config.compiler.keep_debug_copies, 8);
    }
}
