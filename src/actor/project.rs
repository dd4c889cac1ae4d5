//! The open project: where its scripts live and which files count.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::config::ProjectConfig;
use crate::utils::path::{has_extension, is_temp_file};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
    script_root: PathBuf,
    extension: String,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, script_root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            script_root: script_root.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &ProjectConfig) -> Self {
        Self::new(
            config.root(),
            config.script_root(),
            config.scripts.extension.clone(),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn script_root(&self) -> &Path {
        &self.script_root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Every script under the script root, sorted. Empty when the root is missing.
    pub fn script_paths(&self) -> Vec<PathBuf> {
        if !self.script_root.is_dir() {
            return Vec::new();
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(&self.script_root)
            .sort(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .filter(|p| has_extension(p, &self.extension) && !is_temp_file(p))
            .collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_script_paths_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let assets = dir.path().join("assets");
        fs::create_dir_all(assets.join("enemies")).unwrap();
        fs::write(assets.join("Player.nes"), "").unwrap();
        fs::write(assets.join("enemies/Bat.nes"), "").unwrap();
        fs::write(assets.join("Camera.NES"), "").unwrap();
        fs::write(assets.join("notes.txt"), "").unwrap();
        fs::write(assets.join(".Player.nes.swp"), "").unwrap();
        fs::write(assets.join("Player.nes~"), "").unwrap();

        let project = Project::new(dir.path(), &assets, "nes");
        let names: Vec<_> = project
            .script_paths()
            .iter()
            .map(|p| p.strip_prefix(&assets).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("Camera.NES"),
                PathBuf::from("Player.nes"),
                PathBuf::from("enemies/Bat.nes"),
            ]
        );
    }

    #[test]
    fn test_missing_script_root() {
        let dir = TempDir::new().unwrap();
        let project = Project::new(dir.path(), dir.path().join("assets"), "nes");
        assert!(project.script_paths().is_empty());
    }
}
