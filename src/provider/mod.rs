//! Seams between the loader and its host
//!
//! - [`ResourceProvider`] - lists recent tasks and resolves their resources
//! - [`ResultSink`] - receives loaded/unloaded notifications for one task
//! - [`Placeholders`] - values shown while nothing better is available

pub mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::ResourceSize;
use crate::key::TaskKey;

/// A recent task as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: u32,
    pub user_id: u32,
    /// Human-readable title, if the provider knows one
    pub label: Option<String>,
    pub first_active_time: u64,
    pub last_active_time: u64,
}

impl TaskDescriptor {
    pub fn new(id: u32, last_active_time: u64) -> Self {
        Self {
            id,
            user_id: 0,
            label: None,
            first_active_time: last_active_time,
            last_active_time,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_user(mut self, user_id: u32) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn key(&self) -> TaskKey {
        TaskKey::new(self.id, self.user_id, self.last_active_time)
    }
}

/// Source of task listings and per-task resources.
///
/// Implementations report failure by returning `None` (or an empty list);
/// the loader substitutes placeholders and carries on. Calls may block; the
/// worker has no timeout, so a hung provider stalls loading.
pub trait ResourceProvider: Send + Sync + 'static {
    type Icon: ResourceSize + Send + Sync + 'static;
    type Thumbnail: ResourceSize + Send + Sync + 'static;

    fn resolve_icon(&self, key: &TaskKey) -> Option<Self::Icon>;

    fn resolve_thumbnail(&self, key: &TaskKey) -> Option<Self::Thumbnail>;

    /// Up to `limit` recent tasks, most recently active first.
    fn list_recent_tasks(&self, limit: usize) -> Vec<TaskDescriptor>;
}

/// Per-task receiver of resource updates.
///
/// Always invoked on the thread that owns the [`TaskLoader`](crate::TaskLoader).
pub trait ResultSink<I, T> {
    fn on_data_loaded(&self, thumbnail: Arc<T>, icon: Arc<I>);

    fn on_data_unloaded(&self, default_thumbnail: Arc<T>, default_icon: Arc<I>);
}

/// Stand-in values used when a resource is missing or still loading.
#[derive(Debug)]
pub struct Placeholders<I, T> {
    /// Cached and delivered when an icon cannot be resolved
    pub default_icon: Arc<I>,
    /// Cached and delivered when a thumbnail cannot be resolved
    pub default_thumbnail: Arc<T>,
    /// Delivered while a thumbnail is queued for loading
    pub loading_thumbnail: Arc<T>,
}

impl<I, T> Placeholders<I, T> {
    pub fn new(default_icon: I, default_thumbnail: T, loading_thumbnail: T) -> Self {
        Self {
            default_icon: Arc::new(default_icon),
            default_thumbnail: Arc::new(default_thumbnail),
            loading_thumbnail: Arc::new(loading_thumbnail),
        }
    }
}

impl<I, T> Clone for Placeholders<I, T> {
    fn clone(&self) -> Self {
        Self {
            default_icon: Arc::clone(&self.default_icon),
            default_thumbnail: Arc::clone(&self.default_thumbnail),
            loading_thumbnail: Arc::clone(&self.loading_thumbnail),
        }
    }
}
