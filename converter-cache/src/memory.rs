//! In-memory TTL cache over `dashmap`.

use std::time::Duration;

use converter_types::{CachedValue, RateCache};
use dashmap::DashMap;
use tokio::time::Instant;

#[derive(Clone)]
struct CacheEntry {
    value: CachedValue,
    expires_at: Instant,
}

/// Thread-safe in-memory cache with per-entry absolute expiration.
///
/// Expired entries are evicted lazily when read, or in bulk by
/// [`MemoryRateCache::purge_expired`]. Shard locks are never held across
/// an await; the producer in `get_or_create` runs with no lock held.
#[derive(Default)]
pub struct MemoryRateCache {
    entries: DashMap<String, CacheEntry>,
}

impl std::fmt::Debug for MemoryRateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRateCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl MemoryRateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

impl RateCache for MemoryRateCache {
    fn get(&self, key: &str) -> Option<CachedValue> {
        let now = Instant::now();
        let hit = self.entries.get(key).map(|entry| entry.clone())?;
        if hit.expires_at > now {
            tracing::debug!(key, "Cache hit");
            return Some(hit.value);
        }

        // Only evict if nobody refreshed the entry in the meantime.
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        tracing::debug!(key, "Cache entry expired");
        None
    }

    fn insert(&self, key: String, value: CachedValue, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache insert");
        self.entries.insert(key, CacheEntry { value, expires_at });
    }
}
