//! ROM descriptors supplied by the caller's filesystem scan.

use crate::{ArtworkError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A ROM file as seen on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomFile {
    pub path: PathBuf,
    /// File name including extension.
    pub filename: String,
    /// File name without the final extension.
    pub stem: String,
    /// Lowercased extension without the dot; empty when absent.
    pub extension: String,
    /// Size in bytes.
    pub size: u64,
}

impl RomFile {
    /// Build a descriptor from a path and a known size, without touching disk.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.clone());
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            path,
            filename,
            stem,
            extension,
            size,
        }
    }

    /// Build a descriptor from file metadata.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| ArtworkError::io_with_path(e, path))?;
        if !metadata.is_file() {
            return Err(ArtworkError::Validation {
                field: "path".into(),
                message: format!("{} is not a regular file", path.display()),
            });
        }
        Ok(Self::new(path, metadata.len()))
    }
}

/// Algorithm used for a content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Crc32,
    Md5,
    Sha1,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Crc32 => "crc",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
        }
    }
}

/// Content hash of a ROM, stored as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RomHash {
    pub algorithm: HashAlgorithm,
    pub hex: String,
}

impl RomHash {
    pub fn new(algorithm: HashAlgorithm, hex: impl AsRef<str>) -> Self {
        Self {
            algorithm,
            hex: hex.as_ref().trim().to_lowercase(),
        }
    }

    pub fn crc32(hex: impl AsRef<str>) -> Self {
        Self::new(HashAlgorithm::Crc32, hex)
    }

    pub fn md5(hex: impl AsRef<str>) -> Self {
        Self::new(HashAlgorithm::Md5, hex)
    }

    pub fn sha1(hex: impl AsRef<str>) -> Self {
        Self::new(HashAlgorithm::Sha1, hex)
    }
}
