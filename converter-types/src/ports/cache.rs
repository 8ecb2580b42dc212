//! Rate cache port.
//!
//! One cache instance serves several result types. Entries are stored
//! type-erased, so callers must keep keys unique across types by using
//! distinct prefixes (`latest:`, `historical:`).

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A type-erased cached value.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Key-value store with a per-entry absolute expiration.
pub trait RateCache: Send + Sync + 'static {
    /// Returns the value stored under `key` if it has not expired.
    fn get(&self, key: &str) -> Option<CachedValue>;

    /// Stores `value` under `key`, expiring `ttl` from now.
    fn insert(&self, key: String, value: CachedValue, ttl: Duration);
}

impl<T: RateCache + ?Sized> RateCache for Arc<T> {
    fn get(&self, key: &str) -> Option<CachedValue> {
        (**self).get(key)
    }

    fn insert(&self, key: String, value: CachedValue, ttl: Duration) {
        (**self).insert(key, value, ttl)
    }
}

/// Typed helpers over [`RateCache`].
pub trait RateCacheExt: RateCache {
    /// Returns the cached value for `key`, or runs `producer` and caches its output.
    ///
    /// There is no single-flight guarantee: concurrent misses on the same key
    /// each run their producer and the last insert wins. Producer errors are
    /// returned as-is and nothing is cached.
    fn get_or_create<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> impl Future<Output = Result<T, E>> + Send
    where
        T: Clone + Send + Sync + 'static,
        E: Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        async move {
            if let Some(hit) = self.get(key).and_then(|v| v.downcast::<T>().ok()) {
                return Ok((*hit).clone());
            }

            let value = producer().await?;
            self.insert(key.to_string(), Arc::new(value.clone()), ttl);
            Ok(value)
        }
    }
}

impl<C: RateCache + ?Sized> RateCacheExt for C {}
