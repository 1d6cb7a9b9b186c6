//! Ordered working set produced by a reload.

use std::sync::Arc;

use crate::key::TaskKey;
use crate::provider::TaskDescriptor;

/// One recent task and whatever resources were available when it was built.
#[derive(Debug)]
pub struct Task<I, T> {
    pub key: TaskKey,
    pub descriptor: TaskDescriptor,
    /// Set when the icon was cached (or force-loaded for the foremost task)
    pub icon: Option<Arc<I>>,
    pub thumbnail: Option<Arc<T>>,
    /// The most recently active task, always last in its stack
    pub is_foremost: bool,
}

impl<I, T> Task<I, T> {
    pub fn new(descriptor: TaskDescriptor, is_foremost: bool) -> Self {
        Self {
            key: descriptor.key(),
            descriptor,
            icon: None,
            thumbnail: None,
            is_foremost,
        }
    }

    pub fn has_resources(&self) -> bool {
        self.icon.is_some() && self.thumbnail.is_some()
    }
}

/// Tasks ordered oldest first, foremost last.
#[derive(Debug)]
pub struct TaskStack<I, T> {
    tasks: Vec<Task<I, T>>,
}

impl<I, T> Default for TaskStack<I, T> {
    fn default() -> Self {
        Self { tasks: Vec::new() }
    }
}

impl<I, T> TaskStack<I, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: Task<I, T>) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task<I, T>] {
        &self.tasks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task<I, T>> {
        self.tasks.iter()
    }

    pub fn foremost(&self) -> Option<&Task<I, T>> {
        self.tasks.last().filter(|t| t.is_foremost)
    }

    pub fn find(&self, id: u32) -> Option<&Task<I, T>> {
        self.tasks.iter().find(|t| t.key.id == id)
    }

    pub fn keys(&self) -> Vec<TaskKey> {
        self.tasks.iter().map(|t| t.key).collect()
    }
}

impl<I, T> IntoIterator for TaskStack<I, T> {
    type Item = Task<I, T>;
    type IntoIter = std::vec::IntoIter<Task<I, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}
