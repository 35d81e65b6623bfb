//! Memo Pool - in-process caching and resource pooling
//!
//! A TTL + LRU cache keyed by SHA-256 fingerprints, memoization of sync and
//! async functions on top of it, a bounded pool of reusable handles, and a
//! background reaper for expired entries. The `api` module exposes the
//! cache and an upstream connection pool over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod memoize;
pub mod models;
pub mod pool;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use cache::{CacheKey, CacheStats, CacheStore};
pub use config::Config;
pub use error::{CacheError, PoolError, ServiceError};
pub use memoize::{
    memoize_async, memoize_async_with_key, memoize_sync, memoize_sync_with_key, MemoizeOptions,
};
pub use pool::{HandleFactory, PoolHandle, PoolStats, Pooled, ResourcePool};
pub use tasks::Reaper;
