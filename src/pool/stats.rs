//! Pool Statistics Module

use serde::Serialize;

// == Counters ==
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub created: u64,
    pub reused: u64,
    pub closed: u64,
    pub errors: u64,
}

// == Pool Stats ==
/// Point-in-time snapshot of pool usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub max_connections: usize,
    /// Handles currently open, idle or borrowed
    pub active_connections: usize,
    /// Idle handles ready for reuse
    pub available_connections: usize,
    pub created: u64,
    pub reused: u64,
    pub closed: u64,
    /// Factory or liveness failures
    pub errors: u64,
}

impl PoolStats {
    pub(crate) fn snapshot(
        counters: Counters,
        max_connections: usize,
        active_connections: usize,
        available_connections: usize,
    ) -> Self {
        Self {
            max_connections,
            active_connections,
            available_connections,
            created: counters.created,
            reused: counters.reused,
            closed: counters.closed,
            errors: counters.errors,
        }
    }

    /// Handles currently held by callers.
    pub fn borrowed_connections(&self) -> usize {
        self.active_connections - self.available_connections
    }
}
