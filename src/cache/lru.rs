//! Single-threaded weighted LRU core.
//!
//! One ordered associative container: a hash index into an array of slots,
//! with the slots threaded onto a doubly linked recency list by index.
//!
//! ```text
//!   head (MRU) ──► [D] ◄──► [A] ◄──► [C] ◄── tail (LRU)
//!
//!   index: HashMap<K, usize> ──► slots: Vec<Option<Node>>
//!   free:  Vec<usize>            (reused slot indices)
//! ```
//!
//! Promote, detach and pop-tail are O(1). Locking is the caller's job.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

const NIL: usize = usize::MAX;

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub key: K,
    pub value: Arc<V>,
    pub weight: usize,
    pub stamp: u64,
    prev: usize,
    next: usize,
}

#[derive(Debug)]
pub(crate) struct LruCore<K, V> {
    index: HashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    weight: usize,
}

impl<K, V> LruCore<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            weight: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Sum of the weights of all resident entries.
    pub fn weight(&self) -> usize {
        self.weight
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Looks up `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&Node<K, V>> {
        let idx = *self.index.get(key)?;
        self.promote(idx);
        self.slots[idx].as_ref()
    }

    /// Looks up `key` without touching recency.
    pub fn peek(&self, key: &K) -> Option<&Node<K, V>> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref()
    }

    /// Inserts or overwrites `key` as the most recently used entry.
    ///
    /// On overwrite the stored key is replaced too, so a newer version of an
    /// equal key takes its place. Returns the slot index of the entry.
    pub fn insert(&mut self, key: K, value: Arc<V>, weight: usize, stamp: u64) -> usize {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.slots[idx].as_mut() {
                self.weight = self.weight - node.weight + weight;
                node.key = key;
                node.value = value;
                node.weight = weight;
                node.stamp = stamp;
            }
            self.promote(idx);
            return idx;
        }

        let node = Node {
            key: key.clone(),
            value,
            weight,
            stamp,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.attach_front(idx);
        self.weight += weight;
        idx
    }

    pub fn remove(&mut self, key: &K) -> Option<Node<K, V>> {
        let idx = self.index.remove(key)?;
        self.release(idx)
    }

    /// Removes the least recently used entry, never the one at `keep`.
    pub fn pop_lru_except(&mut self, keep: usize) -> Option<Node<K, V>> {
        let mut idx = self.tail;
        if idx == keep && idx != NIL {
            idx = self.slots[idx].as_ref().map_or(NIL, |n| n.prev);
        }
        if idx == NIL {
            return None;
        }
        let key = self.slots[idx].as_ref()?.key.clone();
        self.index.remove(&key);
        self.release(idx)
    }

    pub fn pop_lru(&mut self) -> Option<Node<K, V>> {
        self.pop_lru_except(NIL)
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
        self.weight = 0;
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut idx = self.head;
        while idx != NIL {
            match self.slots[idx].as_ref() {
                Some(node) => {
                    keys.push(node.key.clone());
                    idx = node.next;
                }
                None => break,
            }
        }
        keys
    }

    fn release(&mut self, idx: usize) -> Option<Node<K, V>> {
        self.detach(idx);
        let node = self.slots[idx].take()?;
        self.free.push(idx);
        self.weight -= node.weight;
        Some(node)
    }

    fn promote(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        if prev != NIL {
            if let Some(p) = self.slots[prev].as_mut() {
                p.next = next;
            }
        } else {
            self.head = next;
        }
        if next != NIL {
            if let Some(n) = self.slots[next].as_mut() {
                n.prev = prev;
            }
        } else {
            self.tail = prev;
        }
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = NIL;
            node.next = NIL;
        }
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head != NIL {
            if let Some(h) = self.slots[old_head].as_mut() {
                h.prev = idx;
            }
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }
}
