//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.
//!
//! Entries, access order and counters live behind one mutex, so eviction,
//! expiry removal and insertion are atomic to every caller, including the
//! background reaper.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheKey, CacheStats, Fingerprint, LruTracker};

// == Store State ==
#[derive(Debug)]
struct StoreState<V> {
    /// Fingerprint -> entry
    entries: HashMap<Fingerprint, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    counters: Counters,
}

impl<V> StoreState<V> {
    fn remove(&mut self, fingerprint: &Fingerprint) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(fingerprint)?;
        self.lru.remove(fingerprint);
        Some(entry)
    }
}

// == Cache Store ==
/// Thread-safe cache storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    state: Mutex<StoreState<V>>,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(StoreState {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                counters: Counters::default(),
            }),
            max_entries: max_entries.max(1),
            default_ttl,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired, refreshing its access
    /// time. Expired entries are removed and counted as misses.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let fingerprint = key.fingerprint();
        let now = Instant::now();
        let mut state = self.state.lock();

        let expired = match state.entries.get(&fingerprint) {
            None => {
                state.counters.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            state.remove(&fingerprint);
            state.counters.misses += 1;
            state.counters.expirations += 1;
            debug!(%fingerprint, "Cache entry expired on read");
            return None;
        }

        state.counters.hits += 1;
        state.lru.touch(fingerprint);
        let entry = state.entries.get_mut(&fingerprint)?;
        entry.touch(now);
        Some(entry.value.clone())
    }

    // == Set ==
    /// Stores a value, overwriting any previous entry for the key.
    ///
    /// If the key is new and the cache is at capacity, the least recently
    /// used entry is evicted first. `ttl` of `None` uses the default TTL.
    pub fn set(&self, key: &CacheKey, value: V, ttl: Option<Duration>) {
        self.insert(key.fingerprint(), value, ttl, None);
    }

    /// Stores a value tagged with `namespace`, see [`CacheStore::clear_namespace`].
    pub fn set_in(&self, namespace: &str, key: &CacheKey, value: V, ttl: Option<Duration>) {
        self.insert(key.fingerprint(), value, ttl, Some(namespace.to_string()));
    }

    fn insert(
        &self,
        fingerprint: Fingerprint,
        value: V,
        ttl: Option<Duration>,
        namespace: Option<String>,
    ) {
        let now = Instant::now();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut state = self.state.lock();

        let is_overwrite = state.entries.contains_key(&fingerprint);
        if !is_overwrite && state.entries.len() >= self.max_entries {
            if let Some(evicted) = state.lru.evict_oldest() {
                state.entries.remove(&evicted);
                state.counters.evictions += 1;
                debug!(fingerprint = %evicted, "Evicted least recently used entry");
            }
        }

        state
            .entries
            .insert(fingerprint, CacheEntry::new(value, ttl, now, namespace));
        state.lru.touch(fingerprint);
    }

    // == Warm ==
    /// Pre-populates `namespace` with `entries`, returning how many were stored.
    ///
    /// Each entry is stored under `CacheKey::namespaced(namespace, key)`.
    pub fn warm<I>(&self, namespace: &str, entries: I, ttl: Option<Duration>) -> usize
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let mut count = 0;
        for (key, value) in entries {
            self.set_in(namespace, &CacheKey::namespaced(namespace, &key), value, ttl);
            count += 1;
        }
        count
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it was present.
    pub fn delete(&self, key: &CacheKey) -> bool {
        self.state.lock().remove(&key.fingerprint()).is_some()
    }

    // == Clear ==
    /// Removes every entry, returning how many were removed. Hit and miss
    /// counters are kept.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let removed = state.entries.len();
        state.entries.clear();
        state.lru.clear();
        removed
    }

    // == Clear Namespace ==
    /// Removes every entry tagged with `namespace`, returning the count.
    pub fn clear_namespace(&self, namespace: &str) -> usize {
        let mut state = self.state.lock();
        let tagged: Vec<Fingerprint> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.namespace.as_deref() == Some(namespace))
            .map(|(fingerprint, _)| *fingerprint)
            .collect();

        for fingerprint in &tagged {
            state.remove(fingerprint);
        }
        tagged.len()
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed. Hit and miss counters are
    /// not touched.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let expired: Vec<Fingerprint> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(fingerprint, _)| *fingerprint)
            .collect();

        for fingerprint in &expired {
            state.remove(fingerprint);
        }
        state.counters.expirations += expired.len() as u64;
        expired.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats::snapshot(state.counters, state.entries.len(), self.max_entries)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
