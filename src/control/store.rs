//! Key-value store abstraction with per-key expiry.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Field map stored under a single key.
pub type FieldMap = BTreeMap<String, String>;

/// Shared store backing [`SolverControl`](super::SolverControl).
///
/// Keys hold either a plain string or a field map. Any key can carry a
/// time-to-live after which it disappears. Implementations must be safe to
/// share between tasks; no operation takes a lock visible to callers.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Stores a string value, replacing whatever the key held.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Reads a string value.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Removes a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Writes fields into the map at `key`, creating it if needed.
    async fn hset(&self, key: &str, fields: &FieldMap) -> StoreResult<()>;

    /// Reads every field of the map at `key`; empty if absent.
    async fn hgetall(&self, key: &str) -> StoreResult<FieldMap>;

    /// Sets the time-to-live of an existing key. Returns whether it existed.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Lists live keys starting with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

#[derive(Debug, Clone)]
enum Stored {
    Text(String),
    Fields(FieldMap),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Stored,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process [`KeyValueStore`].
///
/// Expired keys are dropped lazily on access. Time is read from the tokio
/// clock, so expiry follows `tokio::time::pause`/`advance` in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|e| e.is_live(now)).count()
    }

    /// Whether no live keys remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every expired key. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        before - entries.len()
    }
}

fn evict_expired(entries: &mut HashMap<String, Entry>, key: &str, now: Instant) {
    if entries.get(key).is_some_and(|e| !e.is_live(now)) {
        entries.remove(key);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value: Stored::Text(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        evict_expired(&mut entries, key, now);
        match entries.get(key) {
            Some(Entry {
                value: Stored::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let now = Instant::now();
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|e| e.is_live(now)))
    }

    async fn hset(&self, key: &str, fields: &FieldMap) -> StoreResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        evict_expired(&mut entries, key, now);
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Stored::Fields(FieldMap::new()),
            expires_at: None,
        });
        match entry.value {
            Stored::Fields(ref mut map) => {
                map.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(())
            }
            Stored::Text(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn hgetall(&self, key: &str) -> StoreResult<FieldMap> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        evict_expired(&mut entries, key, now);
        match entries.get(key) {
            Some(Entry {
                value: Stored::Fields(map),
                ..
            }) => Ok(map.clone()),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(FieldMap::new()),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        evict_expired(&mut entries, key, now);
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
