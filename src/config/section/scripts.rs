//! `[scripts]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [scripts]
//! dir = "assets"        # Script root, relative to the project
//! extension = "nes"     # Tracked extension, without the dot
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Where user scripts live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    pub dir: PathBuf,
    pub extension: String,
}

impl ScriptsConfig {
    pub const DIR: FieldPath = FieldPath::new("scripts.dir");
    pub const EXTENSION: FieldPath = FieldPath::new("scripts.extension");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.dir.is_absolute() {
            diag.error_with_hint(
                Self::DIR,
                "must be relative to the project root",
                "e.g. dir = \"assets\"",
            );
        }
        if self.extension.is_empty() {
            diag.error(Self::EXTENSION, "must not be empty");
        } else if self.extension.starts_with('.') {
            diag.error_with_hint(
                Self::EXTENSION,
                "must not start with a dot",
                format!("use extension = \"{}\"", self.extension.trim_start_matches('.')),
            );
        }
    }
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            extension: "nes".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ProjectConfig, test_parse_config};

    #[test]
    fn test_scripts_config() {
        let config = test_parse_config("[scripts]\ndir = \"src/scripts\"\nextension = \"rks\"");
        assert_eq!(config.scripts.dir.to_str(), Some("src/scripts"));
        assert_eq!(config.scripts.extension, "rks");
    }

    #[test]
    fn test_scripts_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.scripts, ProjectConfig::default().scripts);
        assert_eq!(config.scripts.extension, "nes");
    }

    #[test]
    fn test_extension_with_dot_rejected() {
        let config = test_parse_config("[scripts]\nextension = \".nes\"");
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("scripts.extension"));
    }
}
