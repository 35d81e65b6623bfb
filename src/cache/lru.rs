//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::{BTreeMap, HashMap};

use crate::cache::Fingerprint;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every touch stamps the fingerprint with the next value of a monotonic
/// sequence. The smallest stamp is the least recently used entry, so two
/// accesses landing on the same clock reading still have a strict order.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Next access sequence number
    next_seq: u64,
    /// Access sequence -> fingerprint, oldest first
    order: BTreeMap<u64, Fingerprint>,
    /// Fingerprint -> its current sequence number
    seqs: HashMap<Fingerprint, u64>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a fingerprint as most recently used.
    pub fn touch(&mut self, fingerprint: Fingerprint) {
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(old) = self.seqs.insert(fingerprint, seq) {
            self.order.remove(&old);
        }
        self.order.insert(seq, fingerprint);
    }

    // == Remove ==
    /// Removes a fingerprint from the tracker.
    pub fn remove(&mut self, fingerprint: &Fingerprint) {
        if let Some(seq) = self.seqs.remove(fingerprint) {
            self.order.remove(&seq);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used fingerprint.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<Fingerprint> {
        let (_, fingerprint) = self.order.pop_first()?;
        self.seqs.remove(&fingerprint);
        Some(fingerprint)
    }

    // == Peek Oldest ==
    /// Returns the least recently used fingerprint without removing it.
    pub fn peek_oldest(&self) -> Option<&Fingerprint> {
        self.order.values().next()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.seqs.clear();
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.seqs.contains_key(fingerprint)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn fp(name: &str) -> Fingerprint {
        Fingerprint::of(name.as_bytes())
    }

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruTracker::new();

        lru.touch(fp("key1"));
        lru.touch(fp("key2"));
        lru.touch(fp("key3"));

        // Touch key1 again - key2 becomes the oldest
        lru.touch(fp("key1"));

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some(&fp("key2")));
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut lru = LruTracker::new();

        lru.touch(fp("a"));
        lru.touch(fp("b"));
        lru.touch(fp("c"));
        lru.touch(fp("a"));
        lru.touch(fp("c"));
        lru.touch(fp("b"));

        assert_eq!(lru.evict_oldest(), Some(fp("a")));
        assert_eq!(lru.evict_oldest(), Some(fp("c")));
        assert_eq!(lru.evict_oldest(), Some(fp("b")));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();

        lru.touch(fp("key1"));
        lru.touch(fp("key2"));
        lru.remove(&fp("key1"));
        lru.remove(&fp("nonexistent"));

        assert_eq!(lru.len(), 1);
        assert!(!lru.contains(&fp("key1")));
        assert_eq!(lru.evict_oldest(), Some(fp("key2")));
    }

    #[test]
    fn test_lru_touch_same_key_multiple_times() {
        let mut lru = LruTracker::new();

        lru.touch(fp("key1"));
        lru.touch(fp("key1"));
        lru.touch(fp("key1"));

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some(fp("key1")));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::new();
        lru.touch(fp("a"));
        lru.touch(fp("b"));
        lru.clear();
        assert!(lru.is_empty());
        assert_eq!(lru.evict_oldest(), None);
    }
}
