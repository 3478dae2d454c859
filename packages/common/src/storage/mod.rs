mod error;
mod path;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use path::DiskPath;
pub use traits::{BoxReader, Disk};
