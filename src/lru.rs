//! A fixed-capacity least-recently-used map.
//!
//! Entries live in a [generational_arena::Arena] and are threaded onto an
//! intrusive doubly linked list, most recently used at the head. A hash index
//! maps keys to arena slots, so lookup, promotion and eviction are all O(1).

use std::{collections::HashMap, hash::Hash};

use generational_arena::{Arena, Index};

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<Index>,
    next: Option<Index>,
}

#[derive(Debug)]
pub struct LruMap<K, V> {
    nodes: Arena<Node<K, V>>,
    index: HashMap<K, Index>,
    // most recently used
    head: Option<Index>,
    // least recently used
    tail: Option<Index>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> LruMap<K, V> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            nodes: Arena::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Looks up `key` without touching its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = self.index.get(key)?;
        self.nodes.get(*idx).map(|node| &node.value)
    }

    /// Looks up `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.promote(idx);
        self.nodes.get(idx).map(|node| &node.value)
    }

    /// Inserts `key` as most recently used.
    ///
    /// Returns the entry pushed out to make room: the previous value for the
    /// same key, or the least recently used entry when the map was full.
    pub fn push(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            self.promote(idx);
            let node = self.nodes.get_mut(idx)?;
            let old = std::mem::replace(&mut node.value, value);
            return Some((key, old));
        }

        let evicted = if self.is_full() { self.pop_lru() } else { None };

        let idx = self.nodes.insert(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.index.insert(key, idx);
        self.link_front(idx);

        evicted
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let idx = self.tail?;
        self.unlink(idx);
        let node = self.nodes.remove(idx)?;
        self.index.remove(&node.key);
        Some((node.key, node.value))
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        self.nodes.remove(idx).map(|node| node.value)
    }

    /// Empties the map, yielding entries from most to least recently used.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let mut drained = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            match self.nodes.remove(idx) {
                Some(node) => {
                    cursor = node.next;
                    drained.push((node.key, node.value));
                }
                None => break,
            }
        }
        self.nodes.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
        drained
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            map: self,
            cursor: self.head,
        }
    }

    fn promote(&mut self, idx: Index) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    fn unlink(&mut self, idx: Index) {
        let (prev, next) = match self.nodes.get(idx) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(prev_node) => prev_node.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.nodes.get_mut(n)) {
            Some(next_node) => next_node.prev = prev,
            None => self.tail = prev,
        }

        if let Some(node) = self.nodes.get_mut(idx) {
            node.prev = None;
            node.next = None;
        }
    }

    fn link_front(&mut self, idx: Index) {
        let old_head = self.head;
        if let Some(head_node) = old_head.and_then(|h| self.nodes.get_mut(h)) {
            head_node.prev = Some(idx);
        } else {
            self.tail = Some(idx);
        }
        if let Some(node) = self.nodes.get_mut(idx) {
            node.prev = None;
            node.next = old_head;
        }
        self.head = Some(idx);
    }
}

pub struct Keys<'a, K, V> {
    map: &'a LruMap<K, V>,
    cursor: Option<Index>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.map.nodes.get(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.key)
    }
}
