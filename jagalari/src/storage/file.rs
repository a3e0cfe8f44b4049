//! JSON-file backed storage.
//!
//! The whole store is one JSON object of string values. It is read once at
//! open and rewritten on every change through a temp file and rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{ClientStorage, StorageError};

/// Storage persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open the store at `path`, creating nothing until the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StorageError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "Opened storage");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let text = serde_json::to_string_pretty(&self.values)?;

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, text).map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::open(temp.path().join("state.json")).unwrap();
        assert!(storage.get("anything").unwrap().is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("state.json");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.set("jagalari-gpx-filename", "loop.gpx").unwrap();
        storage.set("other", "x").unwrap();
        storage.remove("other").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(
            reopened.get("jagalari-gpx-filename").unwrap().as_deref(),
            Some("loop.gpx")
        );
        assert!(reopened.get("other").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        std::fs::write(&path, "[not, an, object").unwrap();

        let result = FileStorage::open(&path);

        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }
}
