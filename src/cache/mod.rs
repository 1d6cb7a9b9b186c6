//! Byte-bounded LRU caches for task resources
//!
//! `BoundedResourceCache<K, V>` is shared between the consumer thread and the
//! loader worker. Entries remember the key version they were stored under so
//! callers can tell a fresh value from a stale one.

mod bounded;
mod lru;

pub use bounded::{BoundedResourceCache, CacheStats};

/// Memory accounted against a cache budget for one value.
pub trait ResourceSize {
    fn byte_size(&self) -> usize;
}
