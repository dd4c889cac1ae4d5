//! Artifact directory cleanup.

use crate::config::ProjectConfig;
use crate::log;
use anyhow::{Context, Result};

pub fn clean_project(config: &ProjectConfig) -> Result<()> {
    let store = config.artifact_store();
    let removed = store
        .clean()
        .with_context(|| format!("Failed to remove {}", store.dir().display()))?;

    if removed {
        log!("clean"; "removed {}", store.dir().display());
    } else {
        log!("clean"; "nothing to clean");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_artifact_dir() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::default().with_root(dir.path());
        let store = config.artifact_store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join("diagnostics.json"), "[]").unwrap();

        clean_project(&config).unwrap();
        assert!(!store.dir().exists());
        clean_project(&config).unwrap();
    }
}
