//! Project configuration from `reloadkit.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [scripts], [watch], [compiler]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # config file discovery
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! A missing config file yields defaults; unknown keys are reported as
//! warnings and otherwise ignored.

pub mod section;
pub mod types;
mod util;

pub use section::{CompilerConfig, ScriptsConfig, WatchConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};
pub use util::find_config_file;

use crate::compiler::ArtifactStore;
use crate::utils::path::normalize_path;
use crate::watch::WatchOptions;
use crate::{debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "reloadkit.toml";

/// Written by `reloadkit init`; every value is the default.
pub const TEMPLATE: &str = r#"[scripts]
dir = "assets"          # script root, relative to this file
extension = "nes"       # tracked extension, without the dot

[watch]
debounce_ms = 500       # quiet period before a burst of edits is compiled
retry_ms = 1000         # poll interval while the script root is missing

[compiler]
artifact_dir = "obj/NetEngine_ScriptCompilerAssemblies"
debug_copies = true     # keep <unit>_<timestamp> copies for inspection
keep_debug_copies = 8   # newest copies kept per unit (0 = keep all)
persist_diagnostics = true
"#;

/// Root configuration structure representing `reloadkit.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Absolute path to the config file (may not exist)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root, the config file's directory
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub compiler: CompilerConfig,
}

impl ProjectConfig {
    /// Load the configuration of `project`, or search upward from the
    /// current directory when no project is given.
    pub fn load(project: Option<&Path>, config_name: &Path) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (root, config_path) = match project {
            Some(dir) => {
                let root = cwd.join(dir);
                let config_path = root.join(config_name);
                (root, config_path)
            }
            None => match find_config_file(&cwd, config_name) {
                Some(path) => {
                    let root = path.parent().map_or_else(|| cwd.clone(), Path::to_path_buf);
                    (root, path)
                }
                None => (cwd.clone(), cwd.join(config_name)),
            },
        };

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            debug!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        config.root = normalize_path(&root);
        config.config_path = config_path;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content (no unknown-field reporting).
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Point the configuration at another project root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self.config_path = self.root.join(CONFIG_FILE);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory scanned for scripts.
    pub fn script_root(&self) -> PathBuf {
        self.root.join(&self.scripts.dir)
    }

    pub fn artifact_store(&self) -> ArtifactStore {
        let project = (!self.root.as_os_str().is_empty()).then_some(self.root.as_path());
        ArtifactStore::for_project(project, &self.compiler.artifact_dir)
            .with_keep_debug_copies(self.compiler.keep_debug_copies)
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            debounce: self.watch.debounce(),
            retry: self.watch.retry(),
            extension: self.scripts.extension.clone(),
        }
    }

    /// Validate every section, collecting all errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.scripts.validate(&mut diag);
        self.watch.validate(&mut diag);
        self.compiler.validate(&mut diag);
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config content, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ProjectConfig {
    let (parsed, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(ProjectConfig::from_str("[watch\n").is_err());
    }

    #[test]
    fn test_template_is_default() {
        let parsed = test_parse_config(TEMPLATE);
        let default = ProjectConfig::default();
        assert_eq!(parsed.scripts, default.scripts);
        assert_eq!(parsed.watch, default.watch);
        assert_eq!(parsed.compiler, default.compiler);
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[watch]\ndebounce_ms = 300\nspeed = 2\n\n[renderer]\nvsync = true";
        let (config, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.watch.debounce_ms, 300);
        assert!(ignored.iter().any(|f| f.contains("watch.speed")));
        assert!(ignored.iter().any(|f| f.contains("renderer")));
    }

    #[test]
    fn test_load_missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::load(Some(dir.path()), Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(config.root, normalize_path(dir.path()));
        assert_eq!(config.script_root(), config.root.join("assets"));
        assert_eq!(config.watch_options().extension, "nes");
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[scripts]\ndir = \"scripts\"\n\n[compiler]\nartifact_dir = \"cache\"",
        )
        .unwrap();

        let config = ProjectConfig::load(Some(dir.path()), Path::new(CONFIG_FILE)).unwrap();
        assert!(config.script_root().ends_with("scripts"));
        assert!(config.artifact_store().dir().ends_with("cache"));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[watch]\nretry_ms = 0").unwrap();
        let err = ProjectConfig::load(Some(dir.path()), Path::new(CONFIG_FILE)).unwrap_err();
        assert!(err.to_string().contains("watch.retry_ms"));
    }
}
