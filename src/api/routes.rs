//! API Routes
//!
//! Configures the Axum router with all operator endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, clear_namespace_handler, get_cached_handler, health_handler, stats_handler,
    upstream_get_handler, upstream_ping_handler, warm_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_handler))
        .route("/cache/warm", put(warm_handler))
        .route("/cache/:namespace", delete(clear_namespace_handler))
        .route("/cache/:namespace/:key", get(get_cached_handler))
        .route("/upstream/ping", get(upstream_ping_handler))
        .route("/upstream/get/:key", get(upstream_get_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
