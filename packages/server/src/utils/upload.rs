use common::StorageConfig;
use common::storage::{DiskPath, StorageError};
use uuid::Uuid;

/// MIME types accepted for product import files.
pub const IMPORT_MIME_TYPES: &[&str] = &["text/csv", "text/plain"];

/// Bytes inspected when sniffing for binary content.
const SNIFF_LEN: usize = 8 * 1024;

/// Why an uploaded import file was rejected by the type check.
#[derive(Debug, PartialEq, Eq)]
pub enum ImportTypeError {
    /// The multipart field carried no filename.
    MissingFileName,
    /// The filename does not map to csv or plain text.
    DisallowedType,
    /// The declared type is textual but the content is binary.
    BinaryContent,
}

/// Check that an upload is a csv or plain-text file.
///
/// The client filename decides the declared type; the leading bytes must not
/// contain NUL, which rules out binaries renamed to `.csv`.
pub fn check_import_type(file_name: Option<&str>, head: &[u8]) -> Result<(), ImportTypeError> {
    let file_name = file_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ImportTypeError::MissingFileName)?;

    if file_name.contains(['/', '\\', '\0']) {
        return Err(ImportTypeError::DisallowedType);
    }

    let allowed = mime_guess::from_path(file_name)
        .iter()
        .any(|m| IMPORT_MIME_TYPES.contains(&m.essence_str()));
    if !allowed {
        return Err(ImportTypeError::DisallowedType);
    }

    let sniff = &head[..head.len().min(SNIFF_LEN)];
    if sniff.contains(&0) {
        return Err(ImportTypeError::BinaryContent);
    }

    Ok(())
}

/// Where an import file goes on disk and how it is recorded.
#[derive(Debug, Clone)]
pub struct ImportTarget {
    /// Path on the configured disk, e.g. `upload/importations/<uuid>.csv`.
    pub disk_path: DiskPath,
    /// Path relative to the storage root, e.g. `app/upload/importations/<uuid>.csv`.
    pub recorded_path: String,
}

impl ImportTarget {
    pub fn new(config: &StorageConfig, id: Uuid) -> Result<Self, StorageError> {
        let disk_path = DiskPath::join(&config.import_dir, &format!("{id}.csv"))?;
        let recorded_path = format!("{}/{}", config.disk.trim_matches('/'), disk_path);
        Ok(Self {
            disk_path,
            recorded_path,
        })
    }

    /// A fresh target with a random v4 identifier.
    pub fn generate(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::new(config, Uuid::new_v4())
    }
}
