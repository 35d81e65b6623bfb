//! API Module
//!
//! HTTP handlers and routing for the operator REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache and pool statistics
//! - `PUT /cache/warm` - Pre-populate a namespace
//! - `GET /cache/:namespace/:key` - Read a warmed value
//! - `DELETE /cache/:namespace` - Drop one namespace
//! - `DELETE /cache` - Drop everything
//! - `GET /upstream/ping` - Ping the upstream store over a pooled connection
//! - `GET /upstream/get/:key` - Memoized upstream read

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
