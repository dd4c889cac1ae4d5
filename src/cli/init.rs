//! Project initialization.
//!
//! Creates `reloadkit.toml`, the script root and a sample script.

use crate::config::{CONFIG_FILE, ConfigError, ScriptsConfig, TEMPLATE};
use crate::log;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Written to `<script root>/Rotator.<ext>`.
const SAMPLE_SCRIPT: &str = r#"// Edit and save while `reloadkit watch` runs to see it reload.
namespace Game;

enum Axis { X, Y, Z }

component Rotator : Behaviour {
    speed: float = 90.0;
    axis: Axis = Axis.Y;
    offset: vec3 = (0, 0, 0);
    prop turns: int = 0 { get; set; range(0, 1000) }
}
"#;

const GITIGNORE: &str = "/obj/\n";

/// Initialize a project in `dir` (relative to the current directory), or in
/// the current directory itself.
pub fn init_project(dir: Option<&Path>, config_name: &Path, dry: bool) -> Result<()> {
    if dry {
        print!("{TEMPLATE}");
        return Ok(());
    }

    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let root = dir.map_or_else(|| cwd.clone(), |d| cwd.join(d));
    let created = create_project(&root, config_name)?;

    for path in &created {
        crate::debug!("init"; "created {}", path.display());
    }
    log!("init"; "project initialized in {}", root.display());
    Ok(())
}

/// Lay out a project under `root`. Existing scripts and ignore files are
/// left alone; an existing config is an error. Returns the files written.
pub fn create_project(root: &Path, config_name: &Path) -> Result<Vec<PathBuf>> {
    let config_path = root.join(config_name);
    if config_path.exists() {
        return Err(ConfigError::Exists(config_path).into());
    }

    let scripts = ScriptsConfig::default();
    let script_root = root.join(&scripts.dir);
    fs::create_dir_all(&script_root)
        .with_context(|| format!("Failed to create {}", script_root.display()))?;

    let mut created = Vec::new();
    write_new(&config_path, TEMPLATE, &mut created)?;
    write_new(
        &script_root.join(format!("Rotator.{}", scripts.extension)),
        SAMPLE_SCRIPT,
        &mut created,
    )?;
    write_new(&root.join(".gitignore"), GITIGNORE, &mut created)?;
    Ok(created)
}

fn write_new(path: &Path, content: &str, created: &mut Vec<PathBuf>) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    created.push(path.to_path_buf());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::build::build_project;
    use crate::config::ProjectConfig;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_buildable_project() {
        let dir = TempDir::new().unwrap();
        let created = create_project(dir.path(), Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(created.len(), 3);
        assert!(dir.path().join("assets/Rotator.nes").is_file());

        let config = ProjectConfig::load(Some(dir.path()), Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(config.scripts.extension, "nes");
        assert!(build_project(&config).unwrap());
    }

    #[test]
    fn test_init_refuses_existing_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        let err = create_project(dir.path(), Path::new(CONFIG_FILE)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Exists(_))
        ));
    }

    #[test]
    fn test_init_keeps_existing_scripts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/Rotator.nes"), "component Mine { }").unwrap();

        create_project(dir.path(), Path::new(CONFIG_FILE)).unwrap();
        let content = fs::read_to_string(dir.path().join("assets/Rotator.nes")).unwrap();
        assert_eq!(content, "component Mine { }");
    }
}
