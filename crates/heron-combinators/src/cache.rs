//! Memoization cache storage.
//!
//! [`MemoCache`] is the in-memory backend used by the memoization
//! combinator. Entries are kept in recency order: a lookup hit moves the
//! entry to the back, and LRU eviction removes from the front.
//!
//! Expired TTL entries are dropped lazily, on the lookup that finds them and
//! on insertion when the cache is at capacity.

use heron_core::{CacheKey, EvictionPolicy};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    /// Number of lookups answered from the cache.
    pub hits: u64,
    /// Number of lookups that found no live entry.
    pub misses: u64,
    /// Number of entries removed to respect capacity.
    pub evictions: u64,
    /// Number of entries dropped because their TTL elapsed.
    pub expirations: u64,
    /// Number of entries currently in the cache.
    pub size: usize,
}

impl CacheStats {
    /// Fraction of lookups that were hits, or `0.0` before any lookup.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Storage behind a memoized callable.
///
/// Implementations must be safe to share between threads; every method
/// takes `&self`.
pub trait CacheBackend<V>: Send + Sync {
    /// Returns a live entry, refreshing its recency.
    fn get(&self, key: &CacheKey) -> Option<V>;

    /// Stores a value, evicting as the policy requires.
    fn insert(&self, key: CacheKey, value: V);

    /// Removes an entry, returning its value if it was live.
    fn remove(&self, key: &CacheKey) -> Option<V>;

    /// Whether a live entry exists, without touching recency or statistics.
    fn contains(&self, key: &CacheKey) -> bool;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry. Statistics are kept.
    fn clear(&self);

    /// Returns a snapshot of the statistics.
    fn stats(&self) -> CacheStats;
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> Entry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, policy: &EvictionPolicy) -> bool {
        policy
            .time_to_live()
            .is_some_and(|ttl| self.inserted_at.elapsed() >= ttl)
    }
}

/// In-memory cache honoring an [`EvictionPolicy`].
#[derive(Debug)]
pub struct MemoCache<V> {
    policy: EvictionPolicy,
    entries: Mutex<IndexMap<CacheKey, Entry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl<V> MemoCache<V> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(IndexMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Returns the eviction policy.
    #[must_use]
    pub const fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    /// Keys in recency order, least recently used first.
    #[must_use]
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.lock().keys().cloned().collect()
    }

    fn purge_expired(&self, entries: &mut IndexMap<CacheKey, Entry<V>>) {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(&self.policy));
        let purged = before - entries.len();
        if purged > 0 {
            self.expirations
                .fetch_add(purged as u64, Ordering::Relaxed);
        }
    }
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new(EvictionPolicy::Unbounded)
    }
}

impl<V> CacheBackend<V> for MemoCache<V>
where
    V: Clone + Send,
{
    fn get(&self, key: &CacheKey) -> Option<V> {
        let mut entries = self.entries.lock();

        let Some(index) = entries.get_index_of(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        if entries[index].is_expired(&self.policy) {
            entries.shift_remove_index(index);
            self.expirations.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let last = entries.len() - 1;
        entries.move_index(index, last);
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entries[last].value.clone())
    }

    fn insert(&self, key: CacheKey, value: V) {
        let Some(capacity) = self.policy.capacity() else {
            self.entries.lock().insert(key, Entry::new(value));
            return;
        };
        if capacity == 0 {
            return;
        }

        let mut entries = self.entries.lock();

        // Re-inserting an existing key refreshes it rather than growing the map.
        if entries.shift_remove(&key).is_none() && entries.len() >= capacity {
            self.purge_expired(&mut entries);
            while entries.len() >= capacity {
                if entries.shift_remove_index(0).is_none() {
                    break;
                }
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        entries.insert(key, Entry::new(value));
    }

    fn remove(&self, key: &CacheKey) -> Option<V> {
        let entry = self.entries.lock().shift_remove(key)?;
        (!entry.is_expired(&self.policy)).then_some(entry.value)
    }

    fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .lock()
            .get(key)
            .is_some_and(|entry| !entry.is_expired(&self.policy))
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            size: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key(s: &str) -> CacheKey {
        CacheKey::from_args(&s).unwrap()
    }

    #[test]
    fn test_unbounded_keeps_everything() {
        let cache = MemoCache::new(EvictionPolicy::Unbounded);
        for i in 0..100 {
            cache.insert(CacheKey::from_args(&i).unwrap(), i);
        }
        assert_eq!(cache.len(), 100);
        assert_eq!(cache.get(&CacheKey::from_args(&42).unwrap()), Some(42));
    }

    #[test]
    fn test_lru_evicts_least_recently_used() {
        let cache = MemoCache::new(EvictionPolicy::lru(2));
        cache.insert(key("A"), 1);
        cache.insert(key("B"), 2);
        assert_eq!(cache.get(&key("A")), Some(1));

        cache.insert(key("C"), 3);

        assert!(cache.contains(&key("A")));
        assert!(!cache.contains(&key("B")));
        assert!(cache.contains(&key("C")));
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.keys(), vec![key("A"), key("C")]);
    }

    #[test]
    fn test_reinsert_does_not_evict() {
        let cache = MemoCache::new(EvictionPolicy::lru(2));
        cache.insert(key("A"), 1);
        cache.insert(key("B"), 2);
        cache.insert(key("A"), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.get(&key("A")), Some(10));
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let cache = MemoCache::new(EvictionPolicy::lru(0));
        cache.insert(key("A"), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key("A")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expires_entries() {
        let cache = MemoCache::new(EvictionPolicy::ttl(Duration::from_secs(10)));
        cache.insert(key("rate"), 1.18);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get(&key("rate")), Some(1.18));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(!cache.contains(&key("rate")));
        assert_eq!(cache.get(&key("rate")), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_capacity_purges_expired_before_evicting() {
        let cache = MemoCache::new(EvictionPolicy::Ttl {
            ttl: Duration::from_secs(1),
            capacity: Some(2),
        });
        cache.insert(key("old"), 0);
        tokio::time::advance(Duration::from_secs(2)).await;
        cache.insert(key("A"), 1);
        cache.insert(key("B"), 2);

        assert_eq!(cache.len(), 2);
        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_clear_and_remove() {
        let cache = MemoCache::new(EvictionPolicy::Unbounded);
        cache.insert(key("A"), 1);
        cache.insert(key("B"), 2);

        assert_eq!(cache.remove(&key("A")), Some(1));
        assert_eq!(cache.remove(&key("A")), None);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hit_ratio() {
        let cache = MemoCache::new(EvictionPolicy::Unbounded);
        assert!(cache.stats().hit_ratio().abs() < f64::EPSILON);

        cache.insert(key("A"), 1);
        cache.get(&key("A"));
        cache.get(&key("B"));
        assert!((cache.stats().hit_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
