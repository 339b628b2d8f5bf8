//! Persistent key-value storage for the cart mirror.
//!
//! The cart keeps its authoritative state in memory and mirrors it, fully
//! rewritten on every mutation, under a single key in a [`Storage`]
//! implementation. [`FileStorage`] persists a JSON object file mapping keys
//! to string values; [`MemoryStorage`] backs tests and embedders that do
//! not want persistence.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Errors that can occur reading or writing the store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store file or a stored value is not valid JSON.
    #[error("JSON error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// String key-value storage.
///
/// Values are opaque strings; callers decide the encoding. Implementations
/// must be shareable across the service (`Send + Sync`).
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or decoded.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// =============================================================================
// FileStorage
// =============================================================================

/// File-backed storage: one JSON object file holding every key.
///
/// Writes are synchronous and rewrite the whole file. A missing file reads
/// as an empty store; a corrupt file surfaces as an error on read and is
/// replaced wholesale on the next write.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create a storage adapter over the given file path.
    ///
    /// The file is created lazily on the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<HashMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Store file unreadable, starting fresh");
                HashMap::new()
            }
        };
        map.insert(key.to_string(), value.to_string());
        let raw = serde_json::to_string(&map)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage, used by tests and embedders without persistence.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
