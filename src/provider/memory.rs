//! In-memory resource provider
//!
//! Holds a table of tasks with optional icon and thumbnail sizes. Used by the
//! `recents simulate` command and by tests that need a provider with
//! controllable failures and latency.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;

use super::{Placeholders, ResourceProvider, TaskDescriptor};
use crate::cache::ResourceSize;
use crate::key::TaskKey;

/// A synthetic image: a name and the number of bytes it would occupy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub name: String,
    pub bytes: usize,
}

impl Bitmap {
    pub fn new(name: impl Into<String>, bytes: usize) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl ResourceSize for Bitmap {
    fn byte_size(&self) -> usize {
        self.bytes
    }
}

/// 1x1 ARGB placeholders (4 bytes each).
pub fn blank_placeholders() -> Placeholders<Bitmap, Bitmap> {
    Placeholders::new(
        Bitmap::new("default-icon", 4),
        Bitmap::new("default-thumbnail", 4),
        Bitmap::new("loading-thumbnail", 4),
    )
}

#[derive(Debug, Clone)]
struct StoredTask {
    descriptor: TaskDescriptor,
    icon_bytes: Option<usize>,
    thumbnail_bytes: Option<usize>,
}

/// Provider backed by a task table in memory.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    tasks: RwLock<Vec<StoredTask>>,
    latency: Option<Duration>,
    icon_fetches: AtomicUsize,
    thumbnail_fetches: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long on every resolve call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// `count` tasks with ids `1..=count`, task `count` being the most
    /// recent. Every `missing_every`-th task has no resolvable resources
    /// (0 disables that).
    pub fn synthetic(
        count: u32,
        icon_bytes: usize,
        thumbnail_bytes: usize,
        missing_every: u32,
    ) -> Self {
        let provider = Self::new();
        for id in 1..=count {
            let missing = missing_every > 0 && id % missing_every == 0;
            let (icon, thumbnail) = if missing {
                (None, None)
            } else {
                (Some(icon_bytes), Some(thumbnail_bytes))
            };
            provider.add_task(
                TaskDescriptor::new(id, u64::from(id) * 1_000).with_label(format!("app-{}", id)),
                icon,
                thumbnail,
            );
        }
        provider
    }

    /// Adds or replaces a task. `None` sizes make that resource unresolvable.
    pub fn add_task(
        &self,
        descriptor: TaskDescriptor,
        icon_bytes: Option<usize>,
        thumbnail_bytes: Option<usize>,
    ) {
        let mut tasks = self.tasks.write();
        tasks.retain(|t| t.descriptor.id != descriptor.id);
        tasks.push(StoredTask {
            descriptor,
            icon_bytes,
            thumbnail_bytes,
        });
    }

    pub fn remove_task(&self, id: u32) -> bool {
        let mut tasks = self.tasks.write();
        let before = tasks.len();
        tasks.retain(|t| t.descriptor.id != id);
        tasks.len() < before
    }

    /// Marks a task active at `time`, returning its new key.
    pub fn touch(&self, id: u32, time: u64) -> Option<TaskKey> {
        let mut tasks = self.tasks.write();
        let task = tasks.iter_mut().find(|t| t.descriptor.id == id)?;
        task.descriptor.last_active_time = time;
        Some(task.descriptor.key())
    }

    pub fn icon_fetches(&self) -> usize {
        self.icon_fetches.load(Ordering::SeqCst)
    }

    pub fn thumbnail_fetches(&self) -> usize {
        self.thumbnail_fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, id: u32) -> Option<StoredTask> {
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
        self.tasks
            .read()
            .iter()
            .find(|t| t.descriptor.id == id)
            .cloned()
    }
}

impl ResourceProvider for InMemoryProvider {
    type Icon = Bitmap;
    type Thumbnail = Bitmap;

    fn resolve_icon(&self, key: &TaskKey) -> Option<Bitmap> {
        self.icon_fetches.fetch_add(1, Ordering::SeqCst);
        let task = self.lookup(key.id)?;
        let bytes = task.icon_bytes?;
        Some(Bitmap::new(format!("icon-{}", key.id), bytes))
    }

    fn resolve_thumbnail(&self, key: &TaskKey) -> Option<Bitmap> {
        self.thumbnail_fetches.fetch_add(1, Ordering::SeqCst);
        let task = self.lookup(key.id)?;
        let bytes = task.thumbnail_bytes?;
        Some(Bitmap::new(format!("thumb-{}", key.id), bytes))
    }

    fn list_recent_tasks(&self, limit: usize) -> Vec<TaskDescriptor> {
        let mut listed: Vec<TaskDescriptor> = self
            .tasks
            .read()
            .iter()
            .map(|t| t.descriptor.clone())
            .collect();
        listed.sort_by(|a, b| b.last_active_time.cmp(&a.last_active_time));
        listed.truncate(limit);
        listed
    }
}
