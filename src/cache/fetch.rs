//! Cache-first fetching with stale fallback
//!
//! Recipe data changes rarely, so an old answer is preferred over no answer
//! when the network is unavailable.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, info, warn};

use super::ttl::TtlCache;

/// Returns cached data for `key` or fetches and caches it
///
/// # Behavior
/// - Unless `force_refresh` is set, a fresh cache hit is returned without calling `fetch`
/// - Otherwise `fetch` is awaited once; on success the result is cached and returned
/// - A result that serializes to JSON `null` (such as `Option::None`) is returned
///   but not cached, so the next call asks the network again
/// - A failed cache write is logged and the fetched value is still returned
/// - If `fetch` fails, any stored value for `key` is returned even if expired
/// - If `fetch` fails and nothing was ever stored, `None` is returned
pub async fn get_cached_or_fetch<T, E, F, Fut>(
    cache: &TtlCache,
    key: &str,
    fetch: F,
    force_refresh: bool,
) -> Option<T>
where
    T: Serialize + DeserializeOwned,
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if !force_refresh {
        if let Some(cached) = cache.get(key) {
            debug!(key, "cache hit");
            return Some(cached);
        }
    }

    match fetch().await {
        Ok(fresh) => {
            match serde_json::to_value(&fresh) {
                Ok(Value::Null) => debug!(key, "nothing found, not caching"),
                Ok(value) => {
                    if let Err(e) = cache.put(key, &value) {
                        warn!(key, error = %e, "failed to cache fetched data");
                    }
                }
                Err(e) => warn!(key, error = %e, "failed to serialize fetched data"),
            }
            Some(fresh)
        }
        Err(e) => {
            let stale = cache.get_stale(key);
            if stale.is_some() {
                info!(key, error = %e, "fetch failed, serving stale cache entry");
            } else {
                warn!(key, error = %e, "fetch failed and no cached data available");
            }
            stale
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::{CacheEntry, CacheStore};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn create_test_cache() -> (TtlCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = TtlCache::new(CacheStore::new(temp_dir.path().join("cache.json")));
        (cache, temp_dir)
    }

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

    #[tokio::test]
    async fn test_miss_fetches_once_and_caches() {
        let (cache, _temp_dir) = create_test_cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result: Option<Value> = get_cached_or_fetch(
            &cache,
            "recipe_52772",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(json!({"idMeal": "52772"}))
            },
            false,
        )
        .await;

        assert_eq!(result, Some(json!({"idMeal": "52772"})));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get::<Value>("recipe_52772"), Some(json!({"idMeal": "52772"})));
    }

    #[tokio::test]
    async fn test_fresh_hit_skips_fetch() {
        let (cache, _temp_dir) = create_test_cache();
        cache.put("search_pasta", &json!([{"idMeal": "1"}])).unwrap();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result: Option<Value> = get_cached_or_fetch(
            &cache,
            "search_pasta",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(json!([]))
            },
            false,
        )
        .await;

        assert_eq!(result, Some(json!([{"idMeal": "1"}])));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_fresh_entry() {
        let (cache, _temp_dir) = create_test_cache();
        cache.put("k", "cached").unwrap();

        let result: Option<String> =
            get_cached_or_fetch(&cache, "k", || async { Ok::<_, String>("fresh".to_string()) }, true)
                .await;

        assert_eq!(result.as_deref(), Some("fresh"));
        assert_eq!(cache.get::<String>("k").as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let (cache, _temp_dir) = create_test_cache();
        write_aged(&cache, "k", json!("old"), Duration::hours(25));

        let result: Option<String> =
            get_cached_or_fetch(&cache, "k", || async { Ok::<_, String>("new".to_string()) }, false)
                .await;

        assert_eq!(result.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_stale_entry() {
        let (cache, _temp_dir) = create_test_cache();
        write_aged(&cache, "search_pasta", json!([{"idMeal": "1"}]), Duration::hours(25));

        let result: Option<Value> = get_cached_or_fetch(
            &cache,
            "search_pasta",
            || async { Err::<Value, _>("connection refused") },
            false,
        )
        .await;

        assert_eq!(result, Some(json!([{"idMeal": "1"}])));
    }

    #[tokio::test]
    async fn test_failure_with_force_refresh_still_uses_cache() {
        let (cache, _temp_dir) = create_test_cache();
        cache.put("k", "cached").unwrap();

        let result: Option<String> =
            get_cached_or_fetch(&cache, "k", || async { Err::<String, _>("offline") }, true).await;

        assert_eq!(result.as_deref(), Some("cached"));
    }

    #[tokio::test]
    async fn test_failure_without_cache_returns_none() {
        let (cache, _temp_dir) = create_test_cache();

        let result: Option<Value> =
            get_cached_or_fetch(&cache, "missing", || async { Err::<Value, _>("offline") }, false)
                .await;

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_absent_result_is_not_cached() {
        let (cache, _temp_dir) = create_test_cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let result: Option<Option<Value>> = get_cached_or_fetch(
                &cache,
                "recipe_404",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(None)
                },
                false,
            )
            .await;
            assert_eq!(result, Some(None));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!cache.store().load().unwrap().contains_key("recipe_404"));
    }

    #[tokio::test]
    async fn test_absent_result_keeps_previous_entry() {
        let (cache, _temp_dir) = create_test_cache();
        write_aged(&cache, "recipe_1", json!({"idMeal": "1"}), Duration::hours(30));

        let _: Option<Option<Value>> =
            get_cached_or_fetch(&cache, "recipe_1", || async { Ok::<_, String>(None) }, false)
                .await;

        assert_eq!(cache.get_stale::<Value>("recipe_1"), Some(json!({"idMeal": "1"})));
    }

    #[tokio::test]
    async fn test_empty_list_is_cached() {
        let (cache, _temp_dir) = create_test_cache();

        let _: Option<Vec<i32>> =
            get_cached_or_fetch(&cache, "search_zzz", || async { Ok::<_, String>(Vec::new()) }, false)
                .await;

        assert_eq!(cache.get::<Vec<i32>>("search_zzz"), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_write_failure_still_returns_fetched_value() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the cache file should be makes every write fail
        let path = temp_dir.path().join("cache.json");
        fs::create_dir_all(&path).unwrap();
        let cache = TtlCache::new(CacheStore::new(path));

        let result: Option<String> =
            get_cached_or_fetch(&cache, "k", || async { Ok::<_, String>("fresh".to_string()) }, false)
                .await;

        assert_eq!(result.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_corrupt_store_degrades_to_always_fetch() {
        let (cache, _temp_dir) = create_test_cache();
        fs::write(cache.store().path(), "garbage").unwrap();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let result: Option<i32> = get_cached_or_fetch(
                &cache,
                "k",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(7)
                },
                false,
            )
            .await;
            assert_eq!(result, Some(7));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
