//! Key-value storage behind every on-disk cache.
//!
//! Keys are flat file names inside one cache directory. The file store writes
//! through a temporary sibling and renames it into place, so readers never
//! observe a half-written entry.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    InvalidKey(String),
    Poisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::InvalidKey(key) => write!(f, "invalid cache key: {key:?}"),
            Self::Poisoned => write!(f, "cache store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

pub trait CacheStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
    fn contains(&self, key: &str) -> bool;
    /// When the entry was first created; `None` if it does not exist.
    fn created_at(&self, key: &str) -> Option<SystemTime>;
    /// Path the host can use to reference the entry (icons, previews).
    fn locate(&self, key: &str) -> PathBuf;

    fn read_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .read(key)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }
}

impl<S: CacheStore + ?Sized> CacheStore for std::sync::Arc<S> {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).write(key, bytes)
    }

    fn contains(&self, key: &str) -> bool {
        (**self).contains(key)
    }

    fn created_at(&self, key: &str) -> Option<SystemTime> {
        (**self).created_at(key)
    }

    fn locate(&self, key: &str) -> PathBuf {
        (**self).locate(key)
    }
}

pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0');
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens the cache directory, creating it when missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.exists() {
            crate::logging::info("Cache Dir does not exist and is created.");
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CacheStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(key)?;
        match fs::read(self.root.join(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        let target = self.root.join(key);
        let staging = self
            .root
            .join(format!(".{key}.{}.partial", std::process::id()));
        fs::write(&staging, bytes)?;
        if let Err(err) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(StoreError::Io(err));
        }
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        validate_key(key).is_ok() && self.root.join(key).is_file()
    }

    fn created_at(&self, key: &str) -> Option<SystemTime> {
        validate_key(key).ok()?;
        let meta = fs::metadata(self.root.join(key)).ok()?;
        // Not every filesystem records a birth time.
        meta.created().or_else(|_| meta.modified()).ok()
    }

    fn locate(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    bytes: Vec<u8>,
    created_at: SystemTime,
}

/// In-process store used by tests and dry runs.
#[derive(Debug)]
pub struct MemoryStore {
    root: PathBuf,
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/memory-cache"),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Inserts an entry with an explicit creation time.
    pub fn insert_at(&self, key: &str, bytes: &[u8], created_at: SystemTime) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                MemoryEntry {
                    bytes: bytes.to_vec(),
                    created_at,
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(key)?;
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).map(|entry| entry.bytes.clone()))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Poisoned)?;
        // Mirrors the rename-into-place semantics of the file store.
        entries.insert(
            key.to_string(),
            MemoryEntry {
                bytes: bytes.to_vec(),
                created_at: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    fn created_at(&self, key: &str) -> Option<SystemTime> {
        self.entries
            .lock()
            .ok()?
            .get(key)
            .map(|entry| entry.created_at)
    }

    fn locate(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_key, CacheStore, MemoryStore};

    #[test]
    fn rejects_keys_that_escape_the_cache_dir() {
        assert!(validate_key("../etc").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("w.example.ico").is_ok());
    }

    #[test]
    fn memory_store_overwrite_replaces_entry_and_creation_time() {
        let store = MemoryStore::new();
        let old = std::time::UNIX_EPOCH;
        store.insert_at("k", b"1", old);
        store.write("k", b"2").unwrap();
        assert!(store.created_at("k").unwrap() > old);
        assert_eq!(store.read("k").unwrap(), Some(b"2".to_vec()));
    }
}
