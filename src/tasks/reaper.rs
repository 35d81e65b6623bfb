//! TTL Reaper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;

// == Reaper ==
/// Periodic sweep of a [`CacheStore`] for expired entries.
///
/// Each sweep takes the store's lock only for the duration of the sweep.
/// The task stops when the `Reaper` is stopped or dropped.
#[derive(Debug)]
pub struct Reaper {
    handle: JoinHandle<()>,
}

impl Reaper {
    // == Start ==
    /// Spawns the sweep loop onto `runtime`.
    ///
    /// # Example
    /// ```ignore
    /// let cache = Arc::new(CacheStore::new(1000, Duration::from_secs(300)));
    /// let reaper = Reaper::start(&Handle::current(), cache.clone(), Duration::from_secs(60));
    /// // Later, during shutdown:
    /// reaper.stop();
    /// ```
    pub fn start<V>(runtime: &Handle, cache: Arc<CacheStore<V>>, interval: Duration) -> Self
    where
        V: Clone + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            info!(interval_secs = interval.as_secs_f64(), "Starting TTL reaper");

            loop {
                tokio::time::sleep(interval).await;

                let removed = cache.sweep_expired();
                if removed > 0 {
                    info!("TTL reaper: removed {} expired entries", removed);
                } else {
                    debug!("TTL reaper: no expired entries found");
                }
            }
        });

        Self { handle }
    }

    /// Starts on the current tokio runtime, if there is one.
    ///
    /// Without a runtime this logs a warning and returns `None`; the cache
    /// still expires entries lazily on read.
    pub fn try_start<V>(cache: Arc<CacheStore<V>>, interval: Duration) -> Option<Self>
    where
        V: Clone + Send + 'static,
    {
        match Handle::try_current() {
            Ok(runtime) => Some(Self::start(&runtime, cache, interval)),
            Err(_) => {
                warn!("No tokio runtime available, TTL reaper not started");
                None
            }
        }
    }

    // == Stop ==
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
