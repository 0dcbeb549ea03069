//! Connection registry trait.
//!
//! The UseCase layer depends on this trait only; the infrastructure layer
//! provides the concrete store.

use async_trait::async_trait;

use super::connection::{ConnectionChannel, ConnectionHandle, ConnectionId};

/// Process-wide set of open connections.
///
/// Iteration always works on a snapshot taken at call time, so members added
/// or removed while a caller walks the snapshot never corrupt the walk.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Register a connection. The new member starts out alive.
    async fn add(&self, channel: ConnectionChannel) -> ConnectionId;

    /// Remove a connection. Returns `false` if it was already gone.
    async fn remove(&self, id: &ConnectionId) -> bool;

    /// Set the liveness flag. No-op for removed connections.
    async fn set_alive(&self, id: &ConnectionId, alive: bool);

    /// Copy of the current membership.
    async fn snapshot(&self) -> Vec<ConnectionHandle>;

    /// Atomically remove every member still awaiting a heartbeat and arm the rest.
    ///
    /// Returns the removed members so the caller can close their transports.
    async fn reap_stale(&self) -> Vec<ConnectionHandle>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Visit a snapshot of the members taken at call time.
    ///
    /// The visitor is higher-ranked so it can borrow each snapshot entry only
    /// for the duration of its own call.
    async fn for_each(&self, visit: &mut (dyn for<'h> FnMut(&'h ConnectionHandle) + Send)) {
        for handle in self.snapshot().await {
            visit(&handle);
        }
    }
}
