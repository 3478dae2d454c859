use std::path::PathBuf;

use serde::Deserialize;

/// File storage configuration shared by every component that touches disks.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Storage root. Recorded paths are relative to it. Default: "./storage".
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Name of the disk directory below the root. Default: "app".
    #[serde(default = "default_disk")]
    pub disk: String,
    /// Directory on the disk receiving uploaded import files. Default: "upload/importations".
    #[serde(default = "default_import_dir")]
    pub import_dir: String,
    /// Maximum import file size in kilobytes. Default: 5120.
    #[serde(default = "default_max_import_kb")]
    pub max_import_kb: u64,
}

fn default_root() -> PathBuf {
    PathBuf::from("./storage")
}
fn default_disk() -> String {
    "app".into()
}
fn default_import_dir() -> String {
    "upload/importations".into()
}
fn default_max_import_kb() -> u64 {
    5120
}

impl StorageConfig {
    /// Filesystem root of the configured disk.
    pub fn disk_root(&self) -> PathBuf {
        self.root.join(&self.disk)
    }

    /// Maximum import file size in bytes.
    pub fn max_import_bytes(&self) -> u64 {
        self.max_import_kb.saturating_mul(1024)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            disk: default_disk(),
            import_dir: default_import_dir(),
            max_import_kb: default_max_import_kb(),
        }
    }
}
