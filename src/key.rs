//! Task identity used as the cache and queue key.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A key whose cached value can go stale.
///
/// Caches store `version()` next to each entry and compare it against the
/// caller's key on `get_if_fresh`.
pub trait Versioned {
    fn version(&self) -> u64;
}

/// Identifies a recent task.
///
/// Equality and hashing use `id` only. `last_active_time` changes whenever
/// the task is brought to the front again, which invalidates its cached
/// thumbnail and icon without changing which task it is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskKey {
    pub id: u32,
    pub user_id: u32,
    pub last_active_time: u64,
}

impl TaskKey {
    pub fn new(id: u32, user_id: u32, last_active_time: u64) -> Self {
        Self {
            id,
            user_id,
            last_active_time,
        }
    }

    /// Same task, newer activity timestamp.
    pub fn with_last_active_time(self, last_active_time: u64) -> Self {
        Self {
            last_active_time,
            ..self
        }
    }
}

impl PartialEq for TaskKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TaskKey {}

impl Hash for TaskKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Versioned for TaskKey {
    fn version(&self) -> u64 {
        self.last_active_time
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task#{} (u{}, t={})",
            self.id, self.user_id, self.last_active_time
        )
    }
}
