//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the value was stored
    pub created_at: Instant,
    /// How long the value may be served after `created_at`
    pub ttl: Duration,
    /// Last time the entry was stored or read
    pub last_accessed_at: Instant,
    /// Namespace tag, if the entry was stored into one
    pub namespace: Option<String>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stored at `now`.
    pub fn new(value: V, ttl: Duration, now: Instant, namespace: Option<String>) -> Self {
        Self {
            value,
            created_at: now,
            ttl,
            last_accessed_at: now,
            namespace,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// An entry is still fresh while its age is at most `ttl`; it expires
    /// the moment its age exceeds `ttl`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Touch ==
    pub fn touch(&mut self, now: Instant) {
        self.last_accessed_at = now;
    }

    // == Time To Live ==
    /// Returns remaining TTL, `Duration::ZERO` once expired.
    pub fn ttl_remaining(&self) -> Duration {
        let age = Instant::now().saturating_duration_since(self.created_at);
        self.ttl.saturating_sub(age)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new("test_value", Duration::from_secs(60), now, None);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.created_at, entry.last_accessed_at);
        assert!(!entry.is_expired_at(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::new((), Duration::from_secs(10), now, None);

        // Age equal to ttl is still fresh
        assert!(!entry.is_expired_at(now + Duration::from_secs(10)));
        assert!(entry.is_expired_at(now + Duration::from_secs(10) + Duration::from_millis(1)));
    }

    #[test]
    fn test_touch_updates_last_access_only() {
        let now = Instant::now();
        let mut entry = CacheEntry::new(1, Duration::from_secs(5), now, Some("ns".into()));
        let later = now + Duration::from_secs(3);

        entry.touch(later);

        assert_eq!(entry.last_accessed_at, later);
        assert_eq!(entry.created_at, now);
        // Reads do not extend the lifetime
        assert!(entry.is_expired_at(now + Duration::from_secs(6)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_remaining() {
        let entry = CacheEntry::new(1, Duration::from_secs(10), Instant::now(), None);
        assert_eq!(entry.ttl_remaining(), Duration::from_secs(10));

        advance(Duration::from_secs(4)).await;
        assert_eq!(entry.ttl_remaining(), Duration::from_secs(6));

        advance(Duration::from_secs(30)).await;
        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
        assert!(entry.is_expired());
    }
}
