//! On-disk form of a compiled unit.
//!
//! An image is the magic header followed by a JSON payload. The cached
//! artifact and every debug copy share this encoding, so a cache hit is a
//! plain `read` + `Unit::from_image`.

use super::types::TypeDef;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Leading bytes of every unit artifact.
pub const MAGIC: &[u8] = b"RKUNIT1\n";

/// Payload format version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum UnitError {
    #[error("unit I/O failed on `{}`", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("not a compiled unit (missing header)")]
    BadHeader,

    #[error("unsupported unit format {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("corrupt unit payload")]
    Payload(#[from] serde_json::Error),
}

/// Serializable unit contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitImage {
    pub format: u32,
    pub name: String,
    /// Digest of the sources this image was built from.
    #[serde(default)]
    pub fingerprint: Option<String>,
    pub types: Vec<TypeDef>,
}

impl UnitImage {
    pub fn new(name: impl Into<String>, types: Vec<TypeDef>) -> Self {
        Self {
            format: FORMAT_VERSION,
            name: name.into(),
            fingerprint: None,
            types,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>, UnitError> {
        let mut bytes = MAGIC.to_vec();
        serde_json::to_writer(&mut bytes, self)?;
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, UnitError> {
        let payload = bytes.strip_prefix(MAGIC).ok_or(UnitError::BadHeader)?;
        let image: Self = serde_json::from_slice(payload)?;
        if image.format != FORMAT_VERSION {
            return Err(UnitError::Version {
                found: image.format,
                expected: FORMAT_VERSION,
            });
        }
        Ok(image)
    }

    pub fn read(path: &Path) -> Result<Self, UnitError> {
        let bytes = fs::read(path).map_err(|e| UnitError::Io(path.to_path_buf(), e))?;
        Self::decode(&bytes)
    }
}
