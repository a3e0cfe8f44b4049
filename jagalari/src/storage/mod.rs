//! Durable client-side key-value storage.
//!
//! Values are opaque strings. The session uses three keys, one for the last
//! self-location fix and two for the uploaded track.

mod file;
mod memory;

use std::path::PathBuf;

use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Last successful self-location fix, as JSON.
pub const SELF_LOCATION_KEY: &str = "jagalari-self-location";

/// Raw text of the uploaded GPX track.
pub const TRACK_DATA_KEY: &str = "jagalari-gpx-data";

/// File name of the uploaded GPX track.
pub const TRACK_FILENAME_KEY: &str = "jagalari-gpx-filename";

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of strings.
    #[error("Corrupt storage file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("Failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key-value storage that survives restarts.
pub trait ClientStorage: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}
