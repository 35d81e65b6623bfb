//! Upstream Module
//!
//! Minimal client for a Redis-compatible key-value store, pooled through
//! [`ResourcePool`](crate::pool::ResourcePool).

mod connection;

pub use connection::{TcpConnector, UpstreamConnection};
