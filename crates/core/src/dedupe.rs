use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Time-windowed duplicate suppressor. The pending stream can re-deliver the
/// same transaction several times before it mines; capacity-bounded LRU plus
/// a TTL stamp keeps the window honest without unbounded growth.
pub struct DedupeCache<K> {
    ttl_ms: u64,
    cache: Mutex<LruCache<K, u64>>,
}

impl<K> DedupeCache<K>
where
    K: Hash + Eq,
{
    pub fn new(capacity: usize, ttl_ms: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            ttl_ms,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Atomic test-and-set: true exactly once per key per retention window,
    /// regardless of how many callers race on the same key. A duplicate hit
    /// refreshes the window.
    pub fn check_and_update(&self, key: K, now_ms: u64) -> bool {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(expires_at) = cache.get_mut(&key) {
            if now_ms <= *expires_at {
                *expires_at = now_ms.saturating_add(self.ttl_ms);
                return false;
            }
        }

        let expires_at = now_ms.saturating_add(self.ttl_ms);
        cache.put(key, expires_at);
        true
    }
}
