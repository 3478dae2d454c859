use std::fmt;
use std::path::{Path, PathBuf};

use super::error::StorageError;

/// A relative path inside a disk, validated to stay below the disk root.
///
/// Segments are separated by `/`. Empty segments, `.`, `..`, backslashes and
/// NUL bytes are rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DiskPath(String);

impl DiskPath {
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        if raw.is_empty() {
            return Err(StorageError::InvalidPath("path is empty".into()));
        }
        if raw.starts_with('/') {
            return Err(StorageError::InvalidPath(format!("{raw} is absolute")));
        }
        if raw.contains('\\') || raw.contains('\0') {
            return Err(StorageError::InvalidPath(format!(
                "{raw} contains a forbidden character"
            )));
        }
        for segment in raw.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(StorageError::InvalidPath(format!(
                    "{raw} contains an invalid segment"
                )));
            }
        }
        Ok(Self(raw.to_string()))
    }

    /// Join a directory and a file name into a single disk path.
    pub fn join(dir: &str, file_name: &str) -> Result<Self, StorageError> {
        let dir = dir.trim_matches('/');
        if dir.is_empty() {
            Self::parse(file_name)
        } else {
            Self::parse(&format!("{dir}/{file_name}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve against a disk root on the local filesystem.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, s| acc.join(s))
    }
}

impl fmt::Display for DiskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
