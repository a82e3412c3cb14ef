//! Persistent key-value blob storage.
//!
//! Every record store writes its whole collection as one JSON string under a
//! fixed key, plus a schema version under a second key. The backing medium is
//! abstracted behind [`BlobStore`] so the same stores run against an
//! in-memory map in tests and a directory of files in the CLI.
//!
//! There is no coordination between processes sharing a directory: the last
//! writer wins.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::StorageError;

/// A string-keyed store of string blobs.
pub trait BlobStore: Send + Sync {
    /// Read the blob under `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the blob under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the blob under `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Blob store shared by all record stores of a session.
pub type SharedBlobStore = Arc<dyn BlobStore>;

// =============================================================================
// In-memory
// =============================================================================

/// Blob store backed by a `HashMap`. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, ready to hand to the record stores.
    #[must_use]
    pub fn shared() -> SharedBlobStore {
        Arc::new(Self::new())
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let blobs = self.blobs.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(blobs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut blobs = self.blobs.lock().map_err(|_| StorageError::Poisoned)?;
        blobs.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut blobs = self.blobs.lock().map_err(|_| StorageError::Poisoned)?;
        blobs.remove(key);
        Ok(())
    }
}

// =============================================================================
// File-backed
// =============================================================================

/// Blob store keeping one `<key>.json` file per key in a directory.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a crash never leaves a half-written blob behind.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Open (and create if needed) the directory at `dir`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        debug!(dir = %dir.display(), "Opened file blob store");
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_owned(),
            source,
        };
        let mut file = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        file.write_all(value.as_bytes()).map_err(io_err)?;
        file.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn BlobStore) {
        assert_eq!(store.get("products").unwrap(), None);
        store.set("products", "[]").unwrap();
        assert_eq!(store.get("products").unwrap().as_deref(), Some("[]"));
        store.set("products", "[1]").unwrap();
        assert_eq!(store.get("products").unwrap().as_deref(), Some("[1]"));
        store.remove("products").unwrap();
        store.remove("products").unwrap();
        assert_eq!(store.get("products").unwrap(), None);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryBlobStore::new());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::open(dir.path().join("nested")).unwrap();
        exercise(&store);
        store.set("orders_version", "2").unwrap();
        assert!(dir.path().join("nested/orders_version.json").exists());
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
