use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::path::DiskPath;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Path-addressed file storage, one instance per configured disk.
#[async_trait]
pub trait Disk: Send + Sync {
    /// Write bytes to `path`, replacing any existing file.
    async fn put(&self, path: &DiskPath, data: &[u8]) -> Result<(), StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(path, reader).await.map(|_| ())
    }

    /// Write data from an async reader to `path` and return the number of bytes written.
    async fn put_stream(&self, path: &DiskPath, reader: BoxReader) -> Result<u64, StorageError>;
}
