//! Thread-safe, byte-weighted LRU cache with staleness checks.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::lru::LruCore;
use super::ResourceSize;
use crate::key::Versioned;

/// Point-in-time counters for a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// `get_if_fresh` lookups that found an outdated entry
    pub stale: u64,
    pub puts: u64,
    /// Entries dropped to honour the budget (put overflow or trims)
    pub evictions: u64,
    /// Resident entries
    pub len: usize,
    /// Resident bytes
    pub size: usize,
    /// Byte budget
    pub capacity: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    stale: u64,
    puts: u64,
    evictions: u64,
}

struct Inner<K, V> {
    lru: LruCore<K, V>,
    counters: Counters,
}

/// LRU cache bounded by the summed [`ResourceSize`] of its values.
///
/// All methods take `&self`; a single mutex guards the index, the recency
/// list and the counters, so a consumer thread and the loader worker can use
/// one `Arc<BoundedResourceCache>` concurrently.
pub struct BoundedResourceCache<K, V> {
    name: &'static str,
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> BoundedResourceCache<K, V>
where
    K: Hash + Eq + Clone + Versioned + fmt::Display,
    V: ResourceSize,
{
    /// Create an empty cache with a byte budget of `capacity`.
    ///
    /// `name` only shows up in logs.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            inner: Mutex::new(Inner {
                lru: LruCore::new(),
                counters: Counters::default(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Byte budget fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently resident.
    pub fn size(&self) -> usize {
        self.inner.lock().lru.weight()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().lru.contains(key)
    }

    /// Returns the cached value regardless of its version, marking it most
    /// recently used.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut inner = self.inner.lock();
        let value = inner.lru.get(key).map(|node| Arc::clone(&node.value));
        match value {
            Some(_) => inner.counters.hits += 1,
            None => inner.counters.misses += 1,
        }
        value
    }

    /// Returns the cached value only if it was stored under the same version
    /// as `key`.
    ///
    /// A stale entry is reported as a miss but stays resident until it is
    /// overwritten or evicted.
    pub fn get_if_fresh(&self, key: &K) -> Option<Arc<V>> {
        let mut inner = self.inner.lock();
        let Some(stamp) = inner.lru.peek(key).map(|node| node.stamp) else {
            inner.counters.misses += 1;
            return None;
        };
        if stamp != key.version() {
            inner.counters.stale += 1;
            trace!(cache = self.name, %key, stored = stamp, "stale entry");
            return None;
        }
        inner.counters.hits += 1;
        inner.lru.get(key).map(|node| Arc::clone(&node.value))
    }

    /// Returns the cached value regardless of version together with whether
    /// it is fresh for `key`. Marks the entry most recently used.
    pub fn get_versioned(&self, key: &K) -> Option<(Arc<V>, bool)> {
        let mut inner = self.inner.lock();
        let found = inner
            .lru
            .get(key)
            .map(|node| (Arc::clone(&node.value), node.stamp == key.version()));
        match found {
            Some((_, true)) => inner.counters.hits += 1,
            Some((_, false)) => inner.counters.stale += 1,
            None => inner.counters.misses += 1,
        }
        found
    }

    /// Inserts or overwrites `key`, then evicts least recently used entries
    /// (never this one) while the cache is over budget.
    pub fn put(&self, key: K, value: Arc<V>) {
        let weight = value.byte_size();
        let stamp = key.version();
        let mut inner = self.inner.lock();
        inner.counters.puts += 1;
        trace!(cache = self.name, %key, weight, "put");
        let kept = inner.lru.insert(key, value, weight, stamp);
        while inner.lru.weight() > self.capacity {
            match inner.lru.pop_lru_except(kept) {
                Some(evicted) => {
                    inner.counters.evictions += 1;
                    trace!(cache = self.name, key = %evicted.key, "evicted");
                }
                None => break,
            }
        }
    }

    /// Drops `key` if present.
    pub fn remove(&self, key: &K) {
        self.inner.lock().lru.remove(key);
    }

    /// Drops every entry.
    pub fn evict_all(&self) {
        let mut inner = self.inner.lock();
        let evicted = inner.lru.len() as u64;
        inner.lru.clear();
        inner.counters.evictions += evicted;
    }

    /// Evicts least recently used entries until at most `target` bytes
    /// remain.
    pub fn trim_to_size(&self, target: usize) {
        let mut inner = self.inner.lock();
        while inner.lru.weight() > target || (target == 0 && inner.lru.len() > 0) {
            if inner.lru.pop_lru().is_none() {
                break;
            }
            inner.counters.evictions += 1;
        }
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().lru.keys_by_recency()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.counters.hits,
            misses: inner.counters.misses,
            stale: inner.counters.stale,
            puts: inner.counters.puts,
            evictions: inner.counters.evictions,
            len: inner.lru.len(),
            size: inner.lru.weight(),
            capacity: self.capacity,
        }
    }
}

impl<K, V> fmt::Debug for BoundedResourceCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedResourceCache")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
