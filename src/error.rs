//! Error types for the cache, pool and server
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::memoize::MemoizeError;
use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Errors raised while building or fingerprinting cache keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key content cannot be canonically serialized
    #[error("Key encoding failed: {0}")]
    Encoding(String),
}

// == Pool Error Enum ==
/// Errors surfaced by `ResourcePool::acquire`.
#[derive(Error, Debug)]
pub enum PoolError {
    /// The handle factory failed or produced a dead handle
    #[error("Failed to create pooled handle: {0}")]
    Creation(#[source] anyhow::Error),

    /// No handle became available in time
    #[error("Timed out after {0:?} waiting for a pooled handle")]
    Timeout(Duration),

    /// The pool has been shut down
    #[error("Pool is closed")]
    Closed,
}

// == Upstream Error Enum ==
/// Errors talking to the upstream key-value store.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Upstream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reply did not follow the wire protocol
    #[error("Upstream protocol error: {0}")]
    Protocol(String),

    /// Upstream answered with an error reply
    #[error("Upstream error reply: {0}")]
    Server(String),
}

// == Service Error Enum ==
/// Unified error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Cache(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Pool(PoolError::Creation(_)) => StatusCode::BAD_GATEWAY,
            ServiceError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

impl From<MemoizeError<ServiceError>> for ServiceError {
    fn from(err: MemoizeError<ServiceError>) -> Self {
        match err {
            MemoizeError::Encoding(e) => ServiceError::Cache(e),
            MemoizeError::Call(e) => e,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP handlers.
pub type Result<T> = std::result::Result<T, ServiceError>;
