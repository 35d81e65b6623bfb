//! Memoize Module
//!
//! Wraps a function so repeated calls with the same arguments are served
//! from a [`CacheStore`](crate::cache::CacheStore).
//!
//! Two explicit constructors cover the two call shapes:
//! - [`memoize_sync`] for plain functions `Fn(&A) -> Result<V, E>`
//! - [`memoize_async`] for functions returning a future
//!
//! Keys default to the function name plus the serialized arguments. The
//! `_with_key` variants take a key function instead, so only part of the
//! arguments (or arguments that do not serialize) decide the cache entry.
//!
//! Only successful results are cached. The wrapped function's error is
//! returned unchanged as [`MemoizeError::Call`].

mod async_fn;
mod sync_fn;

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::cache::CacheKey;
use crate::error::CacheError;

pub use async_fn::{memoize_async, memoize_async_with_key, AsyncMemoized, BoxFuture};
pub use sync_fn::{memoize_sync, memoize_sync_with_key, Memoized};

// == Options ==
/// Per-wrapper settings.
#[derive(Debug, Clone, Default)]
pub struct MemoizeOptions {
    /// TTL for stored results, `None` uses the store default
    pub ttl: Option<Duration>,
    /// Key namespace; defaults to the function name
    pub key_prefix: Option<String>,
}

impl MemoizeOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

// == Memoize Error ==
/// Error returned by a memoized call.
#[derive(Error, Debug)]
pub enum MemoizeError<E> {
    /// The arguments could not be encoded into a cache key
    #[error(transparent)]
    Encoding(#[from] CacheError),

    /// The wrapped function failed; nothing was cached
    #[error(transparent)]
    Call(E),
}

impl<E> MemoizeError<E> {
    /// Returns the wrapped function's error, if that is what failed.
    pub fn into_call(self) -> Option<E> {
        match self {
            MemoizeError::Call(e) => Some(e),
            MemoizeError::Encoding(_) => None,
        }
    }
}

// == Key Building ==
/// Turns call arguments into a cache key.
pub(crate) struct KeyBuilder<A: ?Sized>(
    Box<dyn Fn(&A) -> Result<CacheKey, CacheError> + Send + Sync>,
);

impl<A: ?Sized> KeyBuilder<A> {
    pub(crate) fn key(&self, args: &A) -> Result<CacheKey, CacheError> {
        (self.0)(args)
    }
}

/// Identity of a memoized function plus its cache namespace.
#[derive(Debug, Clone)]
pub(crate) struct MemoKeyspace {
    name: String,
    prefix: Option<String>,
}

impl MemoKeyspace {
    pub(crate) fn new(name: String, prefix: Option<String>) -> Self {
        Self { name, prefix }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Namespace tag for stored results.
    pub(crate) fn namespace(&self) -> &str {
        self.prefix.as_deref().unwrap_or(&self.name)
    }

    /// Builds `{"function": name, "prefix": prefix, "args": args}`.
    pub(crate) fn key_for<A: Serialize + ?Sized>(&self, args: &A) -> Result<CacheKey, CacheError> {
        let args = serde_json::to_value(args)
            .map_err(|e| CacheError::Encoding(format!("{}: {}", self.name, e)))?;
        Ok(self.tagged("args", args))
    }

    /// Builds `{"function": name, "prefix": prefix, "key": key}` around a
    /// caller-chosen key.
    pub(crate) fn scoped(&self, key: CacheKey) -> CacheKey {
        let key = match key {
            CacheKey::Text(text) => Value::String(text),
            CacheKey::Structured(map) => Value::Object(map),
        };
        self.tagged("key", key)
    }

    fn tagged(&self, field: &str, value: Value) -> CacheKey {
        let mut map = Map::new();
        map.insert("function".to_string(), Value::from(self.name.as_str()));
        map.insert(
            "prefix".to_string(),
            self.prefix.as_deref().map(Value::from).unwrap_or(Value::Null),
        );
        map.insert(field.to_string(), value);
        CacheKey::Structured(map)
    }

    /// Key builder encoding the full arguments.
    pub(crate) fn args_keys<A>(&self) -> KeyBuilder<A>
    where
        A: Serialize + ?Sized + 'static,
    {
        let keyspace = self.clone();
        KeyBuilder(Box::new(move |args: &A| keyspace.key_for(args)))
    }

    /// Key builder deriving the key from `key_fn` instead of the arguments.
    pub(crate) fn custom_keys<A, K>(&self, key_fn: K) -> KeyBuilder<A>
    where
        A: ?Sized + 'static,
        K: Fn(&A) -> CacheKey + Send + Sync + 'static,
    {
        let keyspace = self.clone();
        KeyBuilder(Box::new(move |args: &A| Ok(keyspace.scoped(key_fn(args)))))
    }
}
