use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::error::StorageError;
use super::path::DiskPath;
use super::traits::{BoxReader, Disk};

/// Local filesystem disk.
///
/// Files live at `{root}/{relative path}`. Writes go to `{root}/.tmp` first
/// and are renamed into place, so readers never observe a partial file.
pub struct FilesystemDisk {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemDisk {
    /// Create a new filesystem disk, creating the root if needed.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root, max_size })
    }

    fn file_path(&self, path: &DiskPath) -> PathBuf {
        path.resolve(&self.root)
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(".tmp").join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl Disk for FilesystemDisk {
    async fn put(&self, path: &DiskPath, data: &[u8]) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        commit(&temp_path, &self.file_path(path)).await
    }

    async fn put_stream(&self, path: &DiskPath, mut reader: BoxReader) -> Result<u64, StorageError> {
        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        commit(&temp_path, &self.file_path(path)).await?;
        tracing::debug!(path = %path, bytes = total_bytes, "File written");
        Ok(total_bytes)
    }
}

/// Move a finished temp file to its final location.
async fn commit(temp_path: &Path, file_path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = file_path.parent()
        && let Err(e) = fs::create_dir_all(parent).await
    {
        let _ = fs::remove_file(temp_path).await;
        return Err(e.into());
    }

    if let Err(e) = fs::rename(temp_path, file_path).await {
        let _ = fs::remove_file(temp_path).await;
        return Err(e.into());
    }

    Ok(())
}
