//! Pool Module
//!
//! A bounded pool of reusable external handles (e.g. connections to a
//! key-value store). Handles are created on demand up to a maximum,
//! acquiring blocks while the pool is exhausted, and released handles are
//! returned for reuse when still usable or closed otherwise.

mod handle;
mod resource;
mod stats;

pub use handle::{HandleFactory, PoolHandle};
pub use resource::{Pooled, ResourcePool};
pub use stats::PoolStats;
