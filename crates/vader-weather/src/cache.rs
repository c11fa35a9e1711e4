//! Coordinate-keyed weather cache, persisted on every write.
//!
//! Entries are never evicted or expired; a stale entry is served until a new
//! fetch for the same coordinate overwrites it.

use std::collections::HashMap;
use std::sync::Arc;

use vader_core::{load_record, save_record, KeyValueStore};

use crate::types::{CacheEntry, CoordinateKey};

/// Storage key of the persisted cache map
pub const CACHE_STORAGE_KEY: &str = "weatherCache";

pub struct WeatherCacheStore {
    entries: HashMap<CoordinateKey, CacheEntry>,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for WeatherCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherCacheStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl WeatherCacheStore {
    /// Load the persisted cache. Missing or corrupt data yields an empty cache.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries: HashMap<CoordinateKey, CacheEntry> =
            load_record(store.as_ref(), CACHE_STORAGE_KEY);
        tracing::debug!("Loaded {} cached weather entries", entries.len());
        Self { entries, store }
    }

    pub fn get(&self, key: &CoordinateKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Insert or overwrite the entry for `key` and persist the whole map.
    ///
    /// A failed write is logged; the in-memory entry is kept either way.
    pub fn put(&mut self, key: CoordinateKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
        if let Err(e) = save_record(self.store.as_ref(), CACHE_STORAGE_KEY, &self.entries) {
            tracing::warn!("Failed to persist weather cache: {}", e);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
