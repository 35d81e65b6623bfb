//! Memoization for asynchronous functions.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheKey, CacheStore};
use crate::memoize::{KeyBuilder, MemoKeyspace, MemoizeError, MemoizeOptions};

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// == Async Memoized ==
/// An asynchronous function whose successful results are cached.
///
/// The store lock is never held across the wrapped function's await, so
/// concurrent misses on the same key may each run the function once.
pub struct AsyncMemoized<A, V, E> {
    keyspace: MemoKeyspace,
    keys: KeyBuilder<A>,
    ttl: Option<Duration>,
    cache: Arc<CacheStore<V>>,
    func: Box<dyn Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync>,
}

fn boxed<A, V, E, F, Fut>(func: F) -> Box<dyn Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync>
where
    A: 'static,
    V: 'static,
    E: 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    Box::new(move |args| -> BoxFuture<'static, Result<V, E>> { Box::pin(func(args)) })
}

/// Wraps an async `func` so calls are looked up in and stored into `cache`.
pub fn memoize_async<A, V, E, F, Fut>(
    cache: Arc<CacheStore<V>>,
    name: impl Into<String>,
    options: MemoizeOptions,
    func: F,
) -> AsyncMemoized<A, V, E>
where
    A: Serialize + 'static,
    V: Clone + 'static,
    E: 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    let keyspace = MemoKeyspace::new(name.into(), options.key_prefix);
    let keys = keyspace.args_keys();
    AsyncMemoized {
        keyspace,
        keys,
        ttl: options.ttl,
        cache,
        func: boxed(func),
    }
}

/// Like [`memoize_async`], but the cache entry is chosen by `key_fn`.
pub fn memoize_async_with_key<A, V, E, K, F, Fut>(
    cache: Arc<CacheStore<V>>,
    name: impl Into<String>,
    options: MemoizeOptions,
    key_fn: K,
    func: F,
) -> AsyncMemoized<A, V, E>
where
    A: 'static,
    V: Clone + 'static,
    E: 'static,
    K: Fn(&A) -> CacheKey + Send + Sync + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    let keyspace = MemoKeyspace::new(name.into(), options.key_prefix);
    let keys = keyspace.custom_keys(key_fn);
    AsyncMemoized {
        keyspace,
        keys,
        ttl: options.ttl,
        cache,
        func: boxed(func),
    }
}

impl<A, V: Clone, E> AsyncMemoized<A, V, E> {
    // == Call ==
    /// Returns the cached result for `args`, or awaits the function and
    /// caches its successful result.
    pub async fn call(&self, args: A) -> Result<V, MemoizeError<E>> {
        let key = self.keys.key(&args)?;

        if let Some(value) = self.cache.get(&key) {
            return Ok(value);
        }

        debug!(function = self.keyspace.name(), "Memoized call missed, awaiting");
        let value = (self.func)(args).await.map_err(MemoizeError::Call)?;
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
