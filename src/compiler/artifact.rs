//! On-disk artifacts: the cached unit per path set, timestamped debug
//! copies and the last diagnostics.
//!
//! ```text
//! <artifact_dir>/
//! ├── ScriptAssembly_0A1B2C3D.unit                      cache
//! ├── ScriptAssembly_0A1B2C3D_1760000000000000000.unit  debug copy
//! └── diagnostics.json
//! ```

use crate::script::Diagnostic;
use crate::unit::{UnitError, UnitImage};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

pub const ARTIFACT_DIR_NAME: &str = "NetEngine_ScriptCompilerAssemblies";
pub const ARTIFACT_EXTENSION: &str = "unit";
pub const DIAGNOSTICS_FILE: &str = "diagnostics.json";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    /// Newest debug copies kept per unit; 0 keeps all.
    keep_debug_copies: usize,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            keep_debug_copies: 0,
        }
    }

    /// `<project>/<relative>`, or the system temp dir without a project.
    pub fn for_project(project: Option<&Path>, relative: &Path) -> Self {
        match project {
            Some(root) => Self::new(root.join(relative)),
            None => Self::new(std::env::temp_dir().join(ARTIFACT_DIR_NAME)),
        }
    }

    pub fn with_keep_debug_copies(mut self, keep: usize) -> Self {
        self.keep_debug_copies = keep;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cached_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{ARTIFACT_EXTENSION}"))
    }

    /// The cached image for `name`, if one exists.
    pub fn load_cached(&self, name: &str) -> Result<Option<UnitImage>, UnitError> {
        let path = self.cached_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        UnitImage::read(&path).map(Some)
    }

    pub fn write_cached(&self, image: &UnitImage) -> Result<PathBuf, UnitError> {
        let path = self.cached_path(&image.name);
        self.write(&path, image)?;
        Ok(path)
    }

    /// Write `<name>_<unix-nanos>.unit`, then prune old copies.
    pub fn write_debug_copy(&self, image: &UnitImage) -> Result<PathBuf, UnitError> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = self
            .dir
            .join(format!("{}_{nanos}.{ARTIFACT_EXTENSION}", image.name));
        self.write(&path, image)?;

        if self.keep_debug_copies > 0 {
            self.prune_debug_copies(&image.name)
                .map_err(|e| UnitError::Io(self.dir.clone(), e))?;
        }
        Ok(path)
    }

    /// Debug copies of `name`, oldest first.
    pub fn debug_copies(&self, name: &str) -> io::Result<Vec<PathBuf>> {
        let prefix = format!("{name}_");
        let mut copies: Vec<(u128, PathBuf)> = Vec::new();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        for entry in entries {
            let path = entry?.path();
            let Some(stem) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(&format!(".{ARTIFACT_EXTENSION}")))
            else {
                continue;
            };
            if let Some(stamp) = stem.strip_prefix(&prefix).and_then(|s| s.parse().ok()) {
                copies.push((stamp, path));
            }
        }

        copies.sort_by_key(|(stamp, _)| *stamp);
        Ok(copies.into_iter().map(|(_, p)| p).collect())
    }

    /// Remove all but the newest `keep_debug_copies` copies of `name`.
    pub fn prune_debug_copies(&self, name: &str) -> io::Result<usize> {
        if self.keep_debug_copies == 0 {
            return Ok(0);
        }
        let copies = self.debug_copies(name)?;
        let excess = copies.len().saturating_sub(self.keep_debug_copies);
        for path in &copies[..excess] {
            fs::remove_file(path)?;
        }
        Ok(excess)
    }

    pub fn write_diagnostics(&self, diagnostics: &[Diagnostic]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec_pretty(diagnostics)?;
        fs::write(self.dir.join(DIAGNOSTICS_FILE), json)
    }

    /// Delete the whole artifact directory. Returns whether it existed.
    pub fn clean(&self) -> io::Result<bool> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Write through a temp file so a reader never sees a torn artifact.
    fn write(&self, path: &Path, image: &UnitImage) -> Result<(), UnitError> {
        let bytes = image.encode()?;
        let io_err = |e| UnitError::Io(path.to_path_buf(), e);
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn image(name: &str) -> UnitImage {
        UnitImage::new(name, Vec::new())
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("obj"));
        assert!(store.load_cached("ScriptAssembly_AAAAAAAA").unwrap().is_none());

        let path = store.write_cached(&image("ScriptAssembly_AAAAAAAA")).unwrap();
        assert_eq!(path.file_name().unwrap(), "ScriptAssembly_AAAAAAAA.unit");
        let loaded = store.load_cached("ScriptAssembly_AAAAAAAA").unwrap().unwrap();
        assert_eq!(loaded.name, "ScriptAssembly_AAAAAAAA");
    }

    #[test]
    fn test_corrupt_cache_is_error() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(store.cached_path("X"), b"garbage").unwrap();
        assert!(matches!(store.load_cached("X"), Err(UnitError::BadHeader)));
    }

    #[test]
    fn test_debug_copies_are_pruned() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).with_keep_debug_copies(2);
        for _ in 0..4 {
            store.write_debug_copy(&image("ScriptAssembly_BBBBBBBB")).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        store.write_cached(&image("ScriptAssembly_BBBBBBBB")).unwrap();

        let copies = store.debug_copies("ScriptAssembly_BBBBBBBB").unwrap();
        assert_eq!(copies.len(), 2);
        assert!(store.cached_path("ScriptAssembly_BBBBBBBB").is_file());
    }

    #[test]
    fn test_diagnostics_and_clean() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("obj"));
        store
            .write_diagnostics(&[Diagnostic::error("unknown type `flot`")])
            .unwrap();
        let json = fs::read_to_string(store.dir().join(DIAGNOSTICS_FILE)).unwrap();
        assert!(json.contains("\"severity\": \"error\""));

        assert!(store.clean().unwrap());
        assert!(!store.clean().unwrap());
    }

    #[test]
    fn test_project_fallback_to_temp() {
        let store = ArtifactStore::for_project(None, Path::new("obj"));
        assert!(store.dir().ends_with(ARTIFACT_DIR_NAME));
        let store = ArtifactStore::for_project(Some(Path::new("/proj")), Path::new("obj/x"));
        assert_eq!(store.dir(), Path::new("/proj/obj/x"));
    }
}
