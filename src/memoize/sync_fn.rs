//! Memoization for synchronous functions.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheKey, CacheStore};
use crate::memoize::{KeyBuilder, MemoKeyspace, MemoizeError, MemoizeOptions};

// == Memoized ==
/// A synchronous function whose successful results are cached.
pub struct Memoized<A: ?Sized, V, E> {
    keyspace: MemoKeyspace,
    keys: KeyBuilder<A>,
    ttl: Option<Duration>,
    cache: Arc<CacheStore<V>>,
    func: Box<dyn Fn(&A) -> Result<V, E> + Send + Sync>,
}

/// Wraps `func` so calls are looked up in and stored into `cache`.
///
/// `name` identifies the function inside the key; two wrappers sharing a
/// name and prefix share results.
pub fn memoize_sync<A, V, E, F>(
    cache: Arc<CacheStore<V>>,
    name: impl Into<String>,
    options: MemoizeOptions,
    func: F,
) -> Memoized<A, V, E>
where
    A: Serialize + ?Sized + 'static,
    V: Clone,
    F: Fn(&A) -> Result<V, E> + Send + Sync + 'static,
{
    let keyspace = MemoKeyspace::new(name.into(), options.key_prefix);
    let keys = keyspace.args_keys();
    Memoized {
        keyspace,
        keys,
        ttl: options.ttl,
        cache,
        func: Box::new(func),
    }
}

/// Like [`memoize_sync`], but the cache entry is chosen by `key_fn`.
///
/// Calls whose arguments map to the same key share one result.
pub fn memoize_sync_with_key<A, V, E, K, F>(
    cache: Arc<CacheStore<V>>,
    name: impl Into<String>,
    options: MemoizeOptions,
    key_fn: K,
    func: F,
) -> Memoized<A, V, E>
where
    A: ?Sized + 'static,
    V: Clone,
    K: Fn(&A) -> CacheKey + Send + Sync + 'static,
    F: Fn(&A) -> Result<V, E> + Send + Sync + 'static,
{
    let keyspace = MemoKeyspace::new(name.into(), options.key_prefix);
    let keys = keyspace.custom_keys(key_fn);
    Memoized {
        keyspace,
        keys,
        ttl: options.ttl,
        cache,
        func: Box::new(func),
    }
}

impl<A, V, E> Memoized<A, V, E>
where
    A: ?Sized,
    V: Clone,
{
    // == Call ==
    /// Returns the cached result for `args`, or runs the function and
    /// caches its successful result.
    pub fn call(&self, args: &A) -> Result<V, MemoizeError<E>> {
        let key = self.keys.key(args)?;

        if let Some(value) = self.cache.get(&key) {
            return Ok(value);
        }

        debug!(function = self.keyspace.name(), "Memoized call missed, invoking");
        let value = (self.func)(args).map_err(MemoizeError::Call)?;
        self.cache
            .set_in(self.keyspace.namespace(), &key, value.clone(), self.ttl);
        Ok(value)
    }

    // == Invalidate ==
    /// Drops every cached result in this wrapper's namespace.
    pub fn invalidate(&self) -> usize {
        self.cache.clear_namespace(self.keyspace.namespace())
    }

    pub fn name(&self) -> &str {
        self.keyspace.name()
    }
}
