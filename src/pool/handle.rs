//! Capabilities a pool needs from the handles it manages.

use async_trait::async_trait;

// == Pool Handle ==
/// An opaque reusable resource.
pub trait PoolHandle: Send + 'static {
    /// Whether the handle can be handed to another caller.
    fn is_usable(&self) -> bool;

    /// Releases the underlying resource. Called at most once.
    fn close(self);
}

// == Handle Factory ==
/// Creates new handles and confirms that fresh ones are alive.
#[async_trait]
pub trait HandleFactory: Send + Sync + 'static {
    type Handle: PoolHandle;

    /// Opens a new handle, e.g. connects and authenticates.
    async fn create(&self) -> anyhow::Result<Self::Handle>;

    /// Liveness check run on every newly created handle.
    async fn is_alive(&self, handle: &mut Self::Handle) -> bool;
}
