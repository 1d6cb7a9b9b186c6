//! Test helper utilities

#![allow(dead_code)]

use std::sync::Arc;

use recents_loader::provider::memory::Bitmap;
use recents_loader::{BoundedResourceCache, TaskKey};

/// Key for task `id` owned by user 0, last active at `time`.
pub fn key(id: u32, time: u64) -> TaskKey {
    TaskKey::new(id, 0, time)
}

pub fn bitmap(name: &str, bytes: usize) -> Arc<Bitmap> {
    Arc::new(Bitmap::new(name, bytes))
}

/// Empty bitmap cache with a byte budget of `capacity`.
pub fn bitmap_cache(capacity: usize) -> BoundedResourceCache<TaskKey, Bitmap> {
    BoundedResourceCache::new("test", capacity)
}

/// Ids of the cached keys, most recently used first.
pub fn cached_ids(cache: &BoundedResourceCache<TaskKey, Bitmap>) -> Vec<u32> {
    cache.keys().iter().map(|k| k.id).collect()
}
