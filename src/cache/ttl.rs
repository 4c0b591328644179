//! Time-based expiry on top of the snapshot store

use chrono::{Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::store::{CacheEntry, CacheStore, StorageError};

/// Default expiration window for cached API responses
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Cache that honors a single fixed expiration window for every entry
///
/// Reads never fail: an unreadable or corrupt store is a cache miss. Expired
/// entries are ignored by `get` but kept on disk until `sweep` runs, so the
/// stale value stays available through `get_stale`.
#[derive(Debug, Clone)]
pub struct TtlCache {
    store: CacheStore,
    ttl: Duration,
}

impl TtlCache {
    /// Creates a cache with the default 24 hour window
    pub fn new(store: CacheStore) -> Self {
        Self::with_ttl(store, Duration::hours(DEFAULT_TTL_HOURS))
    }

    /// Creates a cache with a custom expiration window
    pub fn with_ttl(store: CacheStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// The expiration window applied to every entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The underlying store
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Returns the value for `key` if present and younger than the TTL
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.read_entry(key)?;
        if self.is_expired(&entry) {
            debug!(key, "cache entry expired");
            return None;
        }
        decode(key, entry)
    }

    /// Returns the value for `key` regardless of its age
    pub fn get_stale<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.read_entry(key)?;
        decode(key, entry)
    }

    /// Stores `value` under `key` stamped with the current time
    ///
    /// Any previous entry for the key is replaced in full.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        let mut snapshot = self.store.load()?;
        snapshot.insert(key.to_string(), CacheEntry::new(value));
        self.store.save(&snapshot)
    }

    /// Removes every entry whose age has reached the TTL
    ///
    /// Returns the number of removed entries. The store is only rewritten when
    /// something was removed.
    pub fn sweep(&self) -> Result<usize, StorageError> {
        let mut snapshot = self.store.load()?;
        let before = snapshot.len();
        snapshot.retain(|_, entry| !self.is_expired(entry));
        let removed = before - snapshot.len();

        if removed > 0 {
            self.store.save(&snapshot)?;
        }
        debug!(removed, "swept expired cache entries");
        Ok(removed)
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        Utc::now() - entry.timestamp >= self.ttl
    }

    fn read_entry(&self, key: &str) -> Option<CacheEntry> {
        match self.store.load() {
            Ok(mut snapshot) => snapshot.remove(key),
            Err(e) => {
                warn!(key, error = %e, "cache unreadable, treating as miss");
                None
            }
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, entry: CacheEntry) -> Option<T> {
    match serde_json::from_value(entry.value) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "cached value has unexpected shape, treating as miss");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::Snapshot;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn create_test_cache() -> (TtlCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = TtlCache::new(CacheStore::new(temp_dir.path().join("cache.json")));
        (cache, temp_dir)
    }

    /// Writes an entry directly into the store with a backdated timestamp
    fn write_aged(cache: &TtlCache, key: &str, value: Value, age: Duration) {
        let mut snapshot = cache.store().load().unwrap();
        snapshot.insert(
            key.to_string(),
            CacheEntry {
                timestamp: Utc::now() - age,
                value,
            },
        );
        cache.store().save(&snapshot).unwrap();
    }

    #[test]
    fn test_put_then_get_returns_value() {
        let (cache, _temp_dir) = create_test_cache();
        let data = TestData {
            name: "fresh".to_string(),
            value: 100,
        };

        cache.put("fresh_key", &data).expect("Put should succeed");

        assert_eq!(cache.get::<TestData>("fresh_key"), Some(data));
    }

    #[test]
    fn test_get_missing_key_returns_none() {
        let (cache, _temp_dir) = create_test_cache();
        assert_eq!(cache.get::<Value>("nonexistent_key"), None);
        assert_eq!(cache.get_stale::<Value>("nonexistent_key"), None);
    }

    #[test]
    fn test_expired_entry_only_visible_through_get_stale() {
        let (cache, _temp_dir) = create_test_cache();
        write_aged(&cache, "search_pasta", json!([{"idMeal": "1"}]), Duration::hours(25));

        assert_eq!(cache.get::<Value>("search_pasta"), None);
        assert_eq!(
            cache.get_stale::<Value>("search_pasta"),
            Some(json!([{"idMeal": "1"}]))
        );
        // Reading an expired entry does not delete it
        assert!(cache.store().load().unwrap().contains_key("search_pasta"));
    }

    #[test]
    fn test_entry_exactly_at_ttl_is_expired() {
        let temp_dir = TempDir::new().unwrap();
        let cache = TtlCache::with_ttl(
            CacheStore::new(temp_dir.path().join("cache.json")),
            Duration::zero(),
        );

        cache.put("k", &1).unwrap();

        assert_eq!(cache.get::<i32>("k"), None);
        assert_eq!(cache.get_stale::<i32>("k"), Some(1));
    }

    #[test]
    fn test_entry_just_inside_ttl_is_fresh() {
        let (cache, _temp_dir) = create_test_cache();
        write_aged(&cache, "k", json!("v"), Duration::hours(23));

        assert_eq!(cache.get::<String>("k"), Some("v".to_string()));
    }

    #[test]
    fn test_put_overwrites_value_and_timestamp() {
        let (cache, _temp_dir) = create_test_cache();
        write_aged(&cache, "k", json!("old"), Duration::hours(30));

        cache.put("k", "new").unwrap();

        assert_eq!(cache.get::<String>("k"), Some("new".to_string()));
    }

    #[test]
    fn test_get_on_corrupt_store_is_a_miss() {
        let (cache, _temp_dir) = create_test_cache();
        fs::write(cache.store().path(), "{ broken").unwrap();

        assert_eq!(cache.get::<Value>("k"), None);
        assert_eq!(cache.get_stale::<Value>("k"), None);
    }

    #[test]
    fn test_put_on_corrupt_store_reports_error() {
        let (cache, _temp_dir) = create_test_cache();
        fs::write(cache.store().path(), "{ broken").unwrap();

        let result = cache.put("k", &1);

        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_get_with_wrong_type_is_a_miss() {
        let (cache, _temp_dir) = create_test_cache();
        cache.put("k", "a string").unwrap();

        assert_eq!(cache.get::<TestData>("k"), None);
    }

    #[test]
    fn test_sweep_removes_only_expired_entries() {
        let (cache, _temp_dir) = create_test_cache();
        write_aged(&cache, "old_a", json!(1), Duration::hours(48));
        write_aged(&cache, "old_b", json!(2), Duration::hours(24));
        write_aged(&cache, "young", json!({"nested": [1, 2, 3]}), Duration::hours(2));
        let young_before = cache.store().load().unwrap()["young"].clone();

        let removed = cache.sweep().expect("Sweep should succeed");

        assert_eq!(removed, 2);
        let snapshot: Snapshot = cache.store().load().unwrap();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["young"]);
        assert_eq!(snapshot["young"], young_before);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let (cache, _temp_dir) = create_test_cache();
        write_aged(&cache, "old", json!(1), Duration::hours(25));
        cache.put("new", &2).unwrap();

        assert_eq!(cache.sweep().unwrap(), 1);
        let after_first = fs::read_to_string(cache.store().path()).unwrap();
        assert_eq!(cache.sweep().unwrap(), 0);
        let after_second = fs::read_to_string(cache.store().path()).unwrap();

        assert_eq!(after_first, after_second);
    }

    #[test]
    fn test_sweep_on_missing_store_creates_it() {
        let (cache, _temp_dir) = create_test_cache();

        assert_eq!(cache.sweep().unwrap(), 0);
        assert!(cache.store().path().exists());
    }

    #[test]
    fn test_default_ttl_is_24_hours() {
        let (cache, _temp_dir) = create_test_cache();
        assert_eq!(cache.ttl(), Duration::hours(24));
    }
}
