//! Cache service shared by the element, catalog and weather stores.
//!
//! Entries are grouped into namespaces so eviction is an enumeration over known
//! keys. Every entry carries its own `fetched_at` for TTL checks.

mod backend;
mod error;

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

pub use backend::{CacheBackend, FileBackend, MemoryBackend};
pub use error::StorageError;

use crate::config::CacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Namespace {
    /// Single-satellite orbital elements, keyed by catalog number.
    Elements,
    /// Bulk element feed.
    Catalog,
    /// Hourly forecasts, keyed by rounded location.
    Weather,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub namespace: Namespace,
    pub id: String,
}

impl CacheKey {
    pub fn new(namespace: Namespace, id: impl Into<String>) -> Self {
        Self {
            namespace,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub fetched_at: DateTime<Utc>,
    pub data: T,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, fetched_at: DateTime<Utc>) -> Self {
        Self { fetched_at, data }
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match (now - self.fetched_at).to_std() {
            Ok(age) => age < ttl,
            // fetched_at in the future: clock skew, treat as fresh
            Err(_) => true,
        }
    }
}

type LockMap = StdMutex<HashMap<CacheKey, Arc<Mutex<()>>>>;

pub struct Cache {
    backend: Box<dyn CacheBackend>,
    locks: Arc<LockMap>,
}

/// Held exclusive access to one cache key. The key's lock entry is dropped from the
/// map once nobody holds or waits on it.
pub struct KeyGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: CacheKey,
    locks: Arc<LockMap>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // release first so the map holds the only remaining handle when idle
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap();
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

impl Cache {
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            locks: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    pub fn memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        match &config.dir {
            Some(dir) => {
                log::info!("Using cache directory {}", dir.display());
                Self::new(FileBackend::new(dir.clone()))
            }
            None => Self::memory(),
        }
    }

    /// Read an entry regardless of its age. Unreadable entries are logged and treated as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
        let raw = match self.backend.read(key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Discarding corrupt cache entry {}: {}", key, e);
                None
            }
        }
    }

    pub fn get_fresh<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry<T>> {
        self.get(key).filter(|entry| entry.is_fresh(ttl, now))
    }

    pub fn put<T: Serialize>(
        &self,
        key: &CacheKey,
        entry: &CacheEntry<T>,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entry)?;
        self.backend.write(key, &raw)
    }

    /// Drop every entry in a namespace, returning how many were removed.
    pub fn evict(&self, namespace: Namespace) -> usize {
        let keys = match self.backend.keys(namespace) {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("Cannot enumerate {} cache: {}", namespace, e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys {
            match self.backend.remove(&key) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => log::warn!("Cache evict failed for {}: {}", key, e),
            }
        }
        removed
    }

    pub fn keys(&self, namespace: Namespace) -> Vec<CacheKey> {
        self.backend.keys(namespace).unwrap_or_default()
    }

    /// Exclusive access to one key for a read-fetch-write sequence.
    pub async fn lock(&self, key: &CacheKey) -> KeyGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        KeyGuard {
            guard: Some(lock.lock_owned().await),
            key: key.clone(),
            locks: self.locks.clone(),
        }
    }
}
