//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction,
//! keyed by SHA-256 fingerprints of canonicalized keys.

mod entry;
mod key;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use key::{CacheKey, Fingerprint};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;
