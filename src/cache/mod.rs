//! Local cache for API responses
//!
//! Three layers, leaves first: a JSON snapshot store on disk, a TTL cache that
//! decides freshness, and a cache-first fetch wrapper that falls back to stale
//! entries when the network call fails. Store failures on read paths degrade to
//! cache misses so a broken cache file never stops the application.

mod fetch;
mod store;
mod ttl;

pub use fetch::get_cached_or_fetch;
pub use store::{CacheEntry, CacheStore, Snapshot, StorageError};
pub use ttl::{TtlCache, DEFAULT_TTL_HOURS};

pub(crate) use store::write_json_atomic;
