//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Background reaper interval in seconds
    pub cleanup_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Address of the upstream key-value store
    pub upstream_addr: String,
    /// Maximum number of pooled upstream connections
    pub pool_max_connections: usize,
    /// Seconds to wait for a pooled connection
    pub pool_acquire_timeout: u64,
    /// Seconds to wait when opening an upstream connection
    pub upstream_connect_timeout: u64,
    /// TTL in seconds for memoized upstream reads
    pub upstream_cache_ttl: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `CLEANUP_INTERVAL` - Reaper frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_ADDR` - Key-value store address (default: 127.0.0.1:6379)
    /// - `POOL_MAX_CONNECTIONS` - Pooled connection limit (default: 10)
    /// - `POOL_ACQUIRE_TIMEOUT` - Acquire timeout in seconds (default: 5)
    /// - `UPSTREAM_CONNECT_TIMEOUT` - Connect timeout in seconds (default: 5)
    /// - `UPSTREAM_CACHE_TTL` - TTL of memoized upstream reads (default: 600)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            upstream_addr: env::var("UPSTREAM_ADDR").unwrap_or(defaults.upstream_addr),
            pool_max_connections: env_or("POOL_MAX_CONNECTIONS", defaults.pool_max_connections),
            pool_acquire_timeout: env_or("POOL_ACQUIRE_TIMEOUT", defaults.pool_acquire_timeout),
            upstream_connect_timeout: env_or(
                "UPSTREAM_CONNECT_TIMEOUT",
                defaults.upstream_connect_timeout,
            ),
            upstream_cache_ttl: env_or("UPSTREAM_CACHE_TTL", defaults.upstream_cache_ttl),
        }
    }

    /// Returns a description of the first invalid setting, None if valid.
    pub fn validate(&self) -> Option<String> {
        let positive = [
            ("MAX_ENTRIES", self.max_entries as u64),
            ("DEFAULT_TTL", self.default_ttl),
            ("CLEANUP_INTERVAL", self.cleanup_interval),
            ("POOL_MAX_CONNECTIONS", self.pool_max_connections as u64),
            ("POOL_ACQUIRE_TIMEOUT", self.pool_acquire_timeout),
            ("UPSTREAM_CONNECT_TIMEOUT", self.upstream_connect_timeout),
            ("UPSTREAM_CACHE_TTL", self.upstream_cache_ttl),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Some(format!("{} must be greater than zero", name));
            }
        }
        if self.upstream_addr.is_empty() {
            return Some("UPSTREAM_ADDR cannot be empty".to_string());
        }
        None
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    pub fn pool_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_acquire_timeout)
    }

    pub fn upstream_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_connect_timeout)
    }

    pub fn upstream_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.upstream_cache_ttl)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: 3600,
            cleanup_interval: 60,
            server_port: 3000,
            upstream_addr: "127.0.0.1:6379".to_string(),
            pool_max_connections: 10,
            pool_acquire_timeout: 5,
            upstream_connect_timeout: 5,
            upstream_cache_ttl: 600,
        }
    }
}
