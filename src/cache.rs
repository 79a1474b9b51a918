// TTL cache over car-record lookups.
//
// Entries expire purely by elapsed time since insertion; there is no
// capacity bound and no LRU. An expired entry is logically absent and
// never served, whether or not it is still physically present.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::metrics;

/// Thread-safe time-to-live cache keyed by car ID.
///
/// All entries share one TTL, fixed at construction. The lock is never
/// held across the loader await, so two callers racing on the same
/// expired key may both invoke the loader; the last write wins. For the
/// request volumes this backend sees, the redundant load is cheaper
/// than serializing population.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    inner: Arc<Mutex<HashMap<i64, (V, Instant)>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a non-expired entry, removing it if it has expired.
    pub fn get(&self, key: i64) -> Option<V> {
        let mut map = self.inner.lock().unwrap();
        match map.get(&key) {
            Some((value, inserted_at)) if inserted_at.elapsed() < self.ttl => {
                tracing::debug!(key, "cache hit");
                Some(value.clone())
            }
            Some(_) => {
                tracing::debug!(key, "cache entry expired");
                map.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store a value with the current timestamp.
    pub fn insert(&self, key: i64, value: V) {
        let mut map = self.inner.lock().unwrap();
        map.insert(key, (value, Instant::now()));
    }

    /// Serve a fresh entry, or invoke `loader` and cache its result.
    ///
    /// Loader failures propagate uncached, so a failed lookup is retried
    /// on the next call rather than pinned until expiry.
    pub async fn get_or_load<F, Fut>(&self, key: i64, loader: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.get(key) {
            metrics::CACHE_HITS_TOTAL.inc();
            return Ok(value);
        }
        metrics::CACHE_MISSES_TOTAL.inc();
        tracing::debug!(key, "cache miss, loading from store");
        let value = loader().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Drop a key immediately, regardless of expiry state.
    pub fn invalidate(&self, key: i64) {
        let mut map = self.inner.lock().unwrap();
        map.remove(&key);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut map = self.inner.lock().unwrap();
        map.clear();
    }

    /// Number of physically present entries, expired or not.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
