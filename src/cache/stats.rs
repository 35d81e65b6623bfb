//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Counters ==
/// Monotonic counters kept under the store lock.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

// == Cache Stats ==
/// Point-in-time snapshot of cache performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,
    /// Capacity before LRU eviction starts
    pub max_size: usize,
    /// Lookups that returned a value
    pub hit_count: u64,
    /// Lookups that found nothing or an expired entry
    pub miss_count: u64,
    /// Percentage of lookups that hit, rounded to two decimals
    pub hit_rate: f64,
    /// hit_count + miss_count
    pub total_requests: u64,
    /// Entries removed by LRU eviction
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    pub(crate) fn snapshot(counters: Counters, size: usize, max_size: usize) -> Self {
        let total_requests = counters.hits + counters.misses;
        Self {
            size,
            max_size,
            hit_count: counters.hits,
            miss_count: counters.misses,
            hit_rate: hit_rate(counters.hits, counters.misses),
            total_requests,
            evictions: counters.evictions,
            expirations: counters.expirations,
        }
    }
}

// == Hit Rate ==
/// Returns `round(100 * hits / (hits + misses), 2)` with halves rounded to
/// even, or 0.0 with no requests.
pub(crate) fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        (hits as f64 * 100.0 / total as f64 * 100.0).round_ties_even() / 100.0
    }
}
