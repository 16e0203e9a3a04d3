//! A timed, recency-ordered map.

use std::collections::HashMap;

use crate::time::{Duration, Instant};

/// A map from 32-bit keys to timestamped values, kept in recency order.
///
/// The most recently used entry sits at the head of an intrusive list
/// threaded through an arena of slots; expiry scans from the tail and stops
/// at the first entry that is still fresh. Looking an entry up moves it to
/// the head without refreshing its timestamp; only (re-)insertion refreshes
/// both position and timestamp.
#[derive(Debug, Default)]
pub struct RecencyMap<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    index: HashMap<u32, usize>,
}

#[derive(Debug)]
struct Slot<T> {
    key: u32,
    stamp: Instant,
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<T> RecencyMap<T> {
    /// Create an empty map.
    pub fn new() -> RecencyMap<T> {
        RecencyMap {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            index: HashMap::new(),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether `key` is present, without touching recency.
    pub fn contains(&self, key: u32) -> bool {
        self.index.contains_key(&key)
    }

    /// Look up `key`, moving its entry to the head of the recency order.
    ///
    /// The entry's timestamp is deliberately left alone: recency tracks use,
    /// the timestamp tracks when the mapping was last learned.
    pub fn get(&mut self, key: u32) -> Option<&T> {
        let slot = *self.index.get(&key)?;
        self.unlink(slot);
        self.push_front(slot);
        Some(&self.slots[slot].value)
    }

    /// Insert or refresh the mapping for `key`, stamping it with `stamp` and
    /// moving it to the head of the recency order.
    pub fn insert(&mut self, key: u32, stamp: Instant, value: T) {
        if let Some(&slot) = self.index.get(&key) {
            self.unlink(slot);
            let entry = &mut self.slots[slot];
            entry.stamp = stamp;
            entry.value = value;
            self.push_front(slot);
            return;
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Slot { key, stamp, value, prev: None, next: None };
                slot
            }
            None => {
                self.slots.push(Slot { key, stamp, value, prev: None, next: None });
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        self.push_front(slot);
    }

    /// Drop every entry whose stamp lies `ttl` or more in the past.
    ///
    /// Scans from the least recently used end and stops at the first entry
    /// that is still fresh.
    pub fn expire(&mut self, now: Instant, ttl: Duration) {
        while let Some(slot) = self.tail {
            let entry = &self.slots[slot];
            if entry.stamp + ttl > now {
                break;
            }
            self.index.remove(&entry.key);
            self.unlink(slot);
            self.free.push(slot);
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.slots[slot].prev, self.slots[slot].next);
        match prev {
            Some(prev) => self.slots[prev].next = next,
            None if self.head == Some(slot) => self.head = next,
            None => {}
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None if self.tail == Some(slot) => self.tail = prev,
            None => {}
        }
        self.slots[slot].prev = None;
        self.slots[slot].next = None;
    }

    fn push_front(&mut self, slot: usize) {
        self.slots[slot].prev = None;
        self.slots[slot].next = self.head;
        if let Some(head) = self.head {
            self.slots[head].prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn at(millis: u64) -> Instant {
        Instant::from_millis(millis)
    }

    #[test]
    fn insert_and_get() {
        let mut map = RecencyMap::new();
        assert!(map.is_empty());
        map.insert(1, at(0), "a");
        map.insert(2, at(10), "b");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(1), Some(&"a"));
        assert_eq!(map.get(3), None);
        assert!(map.contains(2));
    }

    #[test]
    fn insert_replaces_value() {
        let mut map = RecencyMap::new();
        map.insert(1, at(0), "a");
        map.insert(1, at(5), "b");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(1), Some(&"b"));
    }

    #[test]
    fn expire_drops_stale_entries() {
        let mut map = RecencyMap::new();
        map.insert(1, at(0), ());
        map.insert(2, at(100), ());
        map.insert(3, at(200), ());

        map.expire(at(150), Duration::from_millis(100));
        assert!(!map.contains(1));
        assert!(!map.contains(2));
        assert!(map.contains(3));
    }

    #[test]
    fn expire_stops_at_first_fresh_entry() {
        let mut map = RecencyMap::new();
        map.insert(1, at(0), ());
        map.insert(2, at(100), ());
        // Using key 1 moves it to the head but keeps its old stamp, so the
        // tail scan now meets the fresh entry first and stops.
        map.get(1);

        map.expire(at(100), Duration::from_millis(50));
        assert!(map.contains(1));
        assert!(map.contains(2));
    }

    #[test]
    fn slots_are_reused() {
        let mut map = RecencyMap::new();
        map.insert(1, at(0), ());
        map.insert(2, at(0), ());
        map.expire(at(1000), Duration::from_millis(100));
        assert!(map.is_empty());

        map.insert(3, at(1000), ());
        map.insert(4, at(1000), ());
        assert_eq!(map.len(), 2);
        assert!(map.contains(3));
        assert!(map.contains(4));
    }
}
