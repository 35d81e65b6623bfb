//! Request DTOs for the operator API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Request body for cache warming (PUT /cache/warm)
///
/// # Fields
/// - `namespace`: Namespace the entries are stored under
/// - `entries`: Key to JSON value
/// - `ttl`: Optional TTL in seconds (uses default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct WarmRequest {
    pub namespace: String,
    pub entries: Map<String, Value>,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl WarmRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.namespace.is_empty() {
            return Some("Namespace cannot be empty".to_string());
        }
        if self.entries.keys().any(|k| k.is_empty()) {
            return Some("Keys cannot be empty".to_string());
        }
        if self.ttl == Some(0) {
            return Some("TTL must be greater than zero".to_string());
        }
        None
    }
}
