//! Resource Pool Module
//!
//! Bounded handle pool with blocking acquire.
//!
//! A semaphore with `max_connections` permits bounds the number of borrowed
//! handles. Idle handles, the open-handle count and the counters share one
//! mutex; it is never held across an await.

use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::error::PoolError;
use crate::pool::stats::Counters;
use crate::pool::{HandleFactory, PoolHandle, PoolStats};

// == Shared State ==
struct PoolState<H> {
    /// Idle handles, most recently released last
    idle: Vec<H>,
    /// Open handles, idle + borrowed
    active: usize,
    counters: Counters,
    closed: bool,
}

struct Shared<H> {
    state: Mutex<PoolState<H>>,
    permits: Arc<Semaphore>,
    max_connections: usize,
}

impl<H: PoolHandle> Shared<H> {
    /// Returns a released handle to the idle set, or closes it.
    fn put_back(&self, handle: H) {
        let mut state = self.state.lock();
        if !state.closed && handle.is_usable() {
            state.idle.push(handle);
            return;
        }

        state.active -= 1;
        state.counters.closed += 1;
        let pool_closed = state.closed;
        drop(state);

        if pool_closed {
            debug!("Closing handle released after pool shutdown");
        } else {
            warn!("Discarding unusable pooled handle");
        }
        handle.close();
    }
}

/// A created handle that has not passed its liveness check yet.
struct Unverified<H: PoolHandle>(Option<H>);

impl<H: PoolHandle> Drop for Unverified<H> {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            debug!("Closing unverified handle");
            handle.close();
        }
    }
}

// == Resource Pool ==
/// Pool of handles produced by a [`HandleFactory`].
pub struct ResourcePool<F: HandleFactory> {
    factory: F,
    shared: Arc<Shared<F::Handle>>,
}

impl<F: HandleFactory> ResourcePool<F> {
    // == Constructor ==
    /// Creates an empty pool. Handles are opened lazily on acquire.
    ///
    /// A `max_connections` of zero is treated as one.
    pub fn new(factory: F, max_connections: usize) -> Self {
        let max_connections = max_connections.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            factory,
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState {
                    idle: Vec::new(),
                    active: 0,
                    counters: Counters::default(),
                    closed: false,
                }),
                permits: Arc::new(Semaphore::new(max_connections)),
                max_connections,
            }),
        }
    }

    // == Acquire ==
    /// Borrows a handle, reusing an idle one or creating a new one.
    ///
    /// Waits while `max_connections` handles are borrowed. Dropping the
    /// returned future cancels the wait without side effects.
    pub async fn acquire(&self) -> Result<Pooled<F::Handle>, PoolError> {
        let permit = Arc::clone(&self.shared.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        let idle = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(PoolError::Closed);
            }
            let handle = state.idle.pop();
            if handle.is_some() {
                state.counters.reused += 1;
            }
            handle
        };

        if let Some(handle) = idle {
            debug!("Reusing idle pooled handle");
            return Ok(Pooled::new(handle, Arc::clone(&self.shared), permit));
        }

        let handle = self.create_handle().await?;

        let mut state = self.shared.state.lock();
        if state.closed {
            drop(state);
            handle.close();
            return Err(PoolError::Closed);
        }
        state.active += 1;
        state.counters.created += 1;
        debug!(active = state.active, "Created pooled handle");
        drop(state);

        Ok(Pooled::new(handle, Arc::clone(&self.shared), permit))
    }

    /// Like [`ResourcePool::acquire`] but gives up after `timeout`.
    pub async fn acquire_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Pooled<F::Handle>, PoolError> {
        tokio::time::timeout(timeout, self.acquire())
            .await
            .map_err(|_| PoolError::Timeout(timeout))?
    }

    async fn create_handle(&self) -> Result<F::Handle, PoolError> {
        let handle = match self.factory.create().await {
            Ok(handle) => handle,
            Err(e) => {
                self.record_error();
                warn!(error = %e, "Handle factory failed");
                return Err(PoolError::Creation(e));
            }
        };

        // Closed on drop, including when this future is cancelled mid-check
        let mut unverified = Unverified(Some(handle));
        if let Some(handle) = unverified.0.as_mut() {
            if self.factory.is_alive(handle).await {
                if let Some(handle) = unverified.0.take() {
                    return Ok(handle);
                }
            }
        }

        self.record_error();
        warn!("New handle failed its liveness check");
        drop(unverified);
        Err(PoolError::Creation(anyhow::anyhow!(
            "liveness check failed on new handle"
        )))
    }

    fn record_error(&self) {
        self.shared.state.lock().counters.errors += 1;
    }

    // == Release ==
    /// Returns a borrowed handle. Equivalent to dropping the guard.
    pub fn release(&self, handle: Pooled<F::Handle>) {
        drop(handle);
    }

    // == Close ==
    /// Shuts the pool down, closing every idle handle.
    ///
    /// Pending and future acquires fail with `PoolError::Closed`; borrowed
    /// handles are closed when released. Returns the number closed now.
    pub fn close(&self) -> usize {
        self.shared.permits.close();

        let idle = {
            let mut state = self.shared.state.lock();
            state.closed = true;
            let idle = std::mem::take(&mut state.idle);
            state.active -= idle.len();
            state.counters.closed += idle.len() as u64;
            idle
        };

        let count = idle.len();
        for handle in idle {
            handle.close();
        }
        if count > 0 {
            debug!(count, "Closed idle pooled handles");
        }
        count
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    // == Stats ==
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        PoolStats::snapshot(
            state.counters,
            self.shared.max_connections,
            state.active,
            state.idle.len(),
        )
    }

    pub fn max_connections(&self) -> usize {
        self.shared.max_connections
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F: HandleFactory> Drop for ResourcePool<F> {
    fn drop(&mut self) {
        self.close();
    }
}

// == Pooled Guard ==
/// A borrowed handle. Dropping it returns the handle to its pool.
pub struct Pooled<H: PoolHandle> {
    handle: ManuallyDrop<H>,
    shared: Arc<Shared<H>>,
    // Released after the handle is back in the idle set
    _permit: OwnedSemaphorePermit,
}

impl<H: PoolHandle> Pooled<H> {
    fn new(handle: H, shared: Arc<Shared<H>>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            handle: ManuallyDrop::new(handle),
            shared,
            _permit: permit,
        }
    }
}

impl<H: PoolHandle> Deref for Pooled<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H: PoolHandle> DerefMut for Pooled<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.handle
    }
}

impl<H: PoolHandle> Drop for Pooled<H> {
    fn drop(&mut self) {
        // SAFETY: `handle` is taken exactly once, here, and never touched again
        let handle = unsafe { ManuallyDrop::take(&mut self.handle) };
        self.shared.put_back(handle);
    }
}

impl<H: PoolHandle + fmt::Debug> fmt::Debug for Pooled<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled").field("handle", &*self.handle).finish()
    }
}
