//! Deduplicating FIFO of keys waiting for the loader worker
//!
//! Keys come out in the order they were first submitted. Submitting a key
//! that is already pending is a no-op. The worker parks in
//! [`LoadQueue::wait_for_work`] while the queue is empty.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

#[derive(Debug)]
struct Pending<K> {
    order: VecDeque<K>,
    members: HashSet<K>,
}

/// Pending load requests plus the monitor the worker blocks on.
#[derive(Debug)]
pub struct LoadQueue<K> {
    pending: Mutex<Pending<K>>,
    work_available: Condvar,
}

impl<K> Default for LoadQueue<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> LoadQueue<K>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Pending {
                order: VecDeque::new(),
                members: HashSet::new(),
            }),
            work_available: Condvar::new(),
        }
    }

    /// Adds `key` unless an equal key is already pending, then wakes the
    /// worker either way.
    ///
    /// Returns `true` if the key was added.
    pub fn enqueue(&self, key: K) -> bool {
        let mut pending = self.pending.lock();
        let added = pending.members.insert(key.clone());
        if added {
            pending.order.push_back(key);
        }
        self.work_available.notify_all();
        added
    }

    /// Pops the oldest pending key without blocking.
    pub fn dequeue(&self) -> Option<K> {
        let mut pending = self.pending.lock();
        let key = pending.order.pop_front()?;
        pending.members.remove(&key);
        Some(key)
    }

    /// Cancels a pending request. Returns `true` if it was pending.
    pub fn remove(&self, key: &K) -> bool {
        let mut pending = self.pending.lock();
        if !pending.members.remove(key) {
            return false;
        }
        pending.order.retain(|k| k != key);
        true
    }

    pub fn clear(&self) {
        let mut pending = self.pending.lock();
        let dropped = pending.order.len();
        pending.order.clear();
        pending.members.clear();
        if dropped > 0 {
            trace!(dropped, "load queue cleared");
        }
        self.work_available.notify_all();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().order.len()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.pending.lock().members.contains(key)
    }

    /// Pending keys in dequeue order.
    pub fn snapshot(&self) -> Vec<K> {
        self.pending.lock().order.iter().cloned().collect()
    }

    /// Blocks while the queue is empty and `interrupted()` is false.
    ///
    /// `interrupted` is evaluated under the queue lock, so a caller that sets
    /// its flag and then calls [`wake`](Self::wake) cannot be missed. Spurious
    /// wakeups are absorbed here; callers re-check their own state on return.
    pub fn wait_for_work(&self, interrupted: impl Fn() -> bool) {
        let mut pending = self.pending.lock();
        while pending.order.is_empty() && !interrupted() {
            self.work_available.wait(&mut pending);
        }
    }

    /// Wakes any thread blocked in `wait_for_work` without adding work.
    pub fn wake(&self) {
        let _pending = self.pending.lock();
        self.work_available.notify_all();
    }
}
