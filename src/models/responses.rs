//! Response DTOs for the operator API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::pool::PoolStats;

/// Response body for GET /cache/:namespace/:key
#[derive(Debug, Clone, Serialize)]
pub struct CacheValueResponse {
    pub namespace: String,
    pub key: String,
    pub value: Value,
}

impl CacheValueResponse {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /cache/warm
#[derive(Debug, Clone, Serialize)]
pub struct WarmResponse {
    /// Success message
    pub message: String,
    pub namespace: String,
    /// Number of entries stored
    pub count: usize,
}

impl WarmResponse {
    pub fn new(namespace: impl Into<String>, count: usize) -> Self {
        let namespace = namespace.into();
        Self {
            message: format!("Warmed {} entries into '{}'", count, namespace),
            namespace,
            count,
        }
    }
}

/// Response body for DELETE /cache and DELETE /cache/:namespace
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// Entries removed
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(scope: &str, removed: usize) -> Self {
        Self {
            message: format!("Cleared {} entries from {}", removed, scope),
            removed,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    pub pool: PoolStats,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, pool: PoolStats) -> Self {
        Self { cache, pool }
    }
}

/// Response body for GET /upstream/get/:key
///
/// `value` is `null` when the upstream store has no such key.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamValueResponse {
    pub key: String,
    pub value: Value,
    pub found: bool,
}

impl UpstreamValueResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            found: !value.is_null(),
            value,
        }
    }
}

/// Response body for GET /upstream/ping
#[derive(Debug, Clone, Serialize)]
pub struct PingResponse {
    pub status: String,
    /// Id of the pooled connection that answered
    pub connection: u64,
}

impl PingResponse {
    pub fn pong(connection: u64) -> Self {
        Self {
            status: "PONG".to_string(),
            connection,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
