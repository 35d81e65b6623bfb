//! API Handlers
//!
//! HTTP request handlers for the operator endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{CacheKey, CacheStore};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::memoize::{memoize_async, AsyncMemoized, MemoizeOptions};
use crate::models::{
    CacheValueResponse, ClearResponse, HealthResponse, PingResponse, StatsResponse,
    UpstreamValueResponse, WarmRequest, WarmResponse,
};
use crate::pool::ResourcePool;
use crate::upstream::TcpConnector;

/// Name under which upstream reads are memoized.
pub const UPSTREAM_GET: &str = "upstream_get";

/// Pool of upstream connections.
pub type UpstreamPool = ResourcePool<TcpConnector>;

/// Application state shared across all handlers.
///
/// The cache and pool are internally synchronized, so handlers share them
/// through plain `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheStore<Value>>,
    pub pool: Arc<UpstreamPool>,
    /// Memoized upstream `GET`, cached in `cache`
    pub upstream_get: Arc<AsyncMemoized<String, Value, ServiceError>>,
    pub acquire_timeout: Duration,
}

impl AppState {
    /// Wires the memoized upstream read onto `cache` and `pool`.
    pub fn new(
        cache: Arc<CacheStore<Value>>,
        pool: Arc<UpstreamPool>,
        upstream_ttl: Duration,
        acquire_timeout: Duration,
    ) -> Self {
        let reader = Arc::clone(&pool);
        let upstream_get = memoize_async(
            Arc::clone(&cache),
            UPSTREAM_GET,
            MemoizeOptions::default().with_ttl(upstream_ttl),
            move |key: String| {
                let pool = Arc::clone(&reader);
                async move {
                    let mut conn = pool.acquire_timeout(acquire_timeout).await?;
                    let value = conn.get(&key).await?;
                    Ok::<_, ServiceError>(value.map(Value::String).unwrap_or(Value::Null))
                }
            },
        );

        Self {
            cache,
            pool,
            upstream_get: Arc::new(upstream_get),
            acquire_timeout,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// No upstream connection is opened until the first request needs one.
    pub fn from_config(config: &Config) -> Self {
        let cache = Arc::new(CacheStore::new(config.max_entries, config.default_ttl()));
        let connector = TcpConnector::new(
            config.upstream_addr.clone(),
            config.upstream_connect_timeout(),
        );
        let pool = Arc::new(ResourcePool::new(connector, config.pool_max_connections));
        Self::new(
            cache,
            pool,
            config.upstream_cache_ttl(),
            config.pool_acquire_timeout(),
        )
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
///
/// Returns cache and pool statistics in one body.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats(), state.pool.stats()))
}

/// Handler for PUT /cache/warm
pub async fn warm_handler(
    State(state): State<AppState>,
    Json(req): Json<WarmRequest>,
) -> Result<Json<WarmResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(Duration::from_secs);
    let count = state.cache.warm(&req.namespace, req.entries, ttl);
    info!(namespace = %req.namespace, count, "Warmed cache");

    Ok(Json(WarmResponse::new(req.namespace, count)))
}

/// Handler for GET /cache/:namespace/:key
pub async fn get_cached_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<CacheValueResponse>> {
    match state.cache.get(&CacheKey::namespaced(&namespace, &key)) {
        Some(value) => Ok(Json(CacheValueResponse::new(namespace, key, value))),
        None => Err(ServiceError::NotFound(format!("{}/{}", namespace, key))),
    }
}

/// Handler for DELETE /cache/:namespace
pub async fn clear_namespace_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Json<ClearResponse> {
    let removed = state.cache.clear_namespace(&namespace);
    info!(namespace = %namespace, removed, "Cleared namespace");
    Json(ClearResponse::new(&format!("namespace '{}'", namespace), removed))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.cache.clear();
    info!(removed, "Cleared cache");
    Json(ClearResponse::new("cache", removed))
}

/// Handler for GET /upstream/ping
///
/// Borrows a pooled connection and pings the upstream store with it.
pub async fn upstream_ping_handler(State(state): State<AppState>) -> Result<Json<PingResponse>> {
    let mut conn = state.pool.acquire_timeout(state.acquire_timeout).await?;
    conn.ping().await?;
    Ok(Json(PingResponse::pong(conn.id())))
}

/// Handler for GET /upstream/get/:key
///
/// Served from the cache when the key was read recently. A missing
/// upstream key is cached as `null` too.
pub async fn upstream_get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<UpstreamValueResponse>> {
    let value = state.upstream_get.call(key.clone()).await?;
    Ok(Json(UpstreamValueResponse::new(key, value)))
}
