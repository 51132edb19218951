use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use super::error::StorageError;
use super::{CacheKey, Namespace};

/// Key-value persistence underneath the cache service.
pub trait CacheBackend: Send + Sync {
    fn read(&self, key: &CacheKey) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &CacheKey, value: &str) -> Result<(), StorageError>;
    /// Returns whether the key existed.
    fn remove(&self, key: &CacheKey) -> Result<bool, StorageError>;
    fn keys(&self, namespace: Namespace) -> Result<Vec<CacheKey>, StorageError>;
}

/// In-process backend. An optional byte capacity makes writes fail once it is exhausted.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<CacheKey, String>>,
    capacity: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryBackend {
    fn read(&self, key: &CacheKey) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &CacheKey, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(capacity) = self.capacity {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| *k != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = capacity.saturating_sub(used);
            if value.len() > available {
                return Err(StorageError::Full {
                    needed: value.len(),
                    available,
                });
            }
        }
        entries.insert(key.clone(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<bool, StorageError> {
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    fn keys(&self, namespace: Namespace) -> Result<Vec<CacheKey>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.namespace == namespace)
            .cloned()
            .collect())
    }
}

/// One JSON file per entry, one folder per namespace.
pub struct FileBackend {
    base: PathBuf,
}

impl FileBackend {
    pub fn new(base: PathBuf) -> Self {
        FileBackend { base }
    }

    fn namespace_path(&self, namespace: Namespace) -> PathBuf {
        self.base.join(namespace.to_string())
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.namespace_path(key.namespace)
            .join(format!("{}.json", file_stem(&key.id)))
    }
}

impl CacheBackend for FileBackend {
    fn read(&self, key: &CacheKey) -> Result<Option<String>, StorageError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    /// Writes to a sibling temp file and renames it over the entry, so a crash
    /// mid-write leaves the previous entry intact.
    fn write(&self, key: &CacheKey, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(self.namespace_path(key.namespace))?;
        let path = self.entry_path(key);
        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, value)?;
        if let Err(e) = std::fs::rename(&temp, &path) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<bool, StorageError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }

    fn keys(&self, namespace: Namespace) -> Result<Vec<CacheKey>, StorageError> {
        let path = self.namespace_path(namespace);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in path.read_dir()? {
            let entry_path = entry?.path();
            if !entry_path.is_file()
                || entry_path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }
            if let Some(id) = entry_path.file_stem().and_then(|s| s.to_str()) {
                keys.push(CacheKey::new(namespace, id));
            }
        }
        Ok(keys)
    }
}

// Ids are catalog numbers, "bulk" or "lat,lon" buckets; anything else is flattened.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | ',' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
