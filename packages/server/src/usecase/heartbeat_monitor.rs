//! UseCase: periodic liveness sweep.
//!
//! Every interval the monitor terminates connections that stayed silent since
//! the previous sweep and arms the others. A client therefore gets one full
//! interval to send `{op:10}` before it is cut off.
//!
//! ## Test notes
//!
//! ### What is tested
//! - `sweep`: the arm-then-terminate cycle
//! - `spawn`: the timer-driven loop and its cancellation
//!
//! ### Why
//! - Termination must only follow a full silent interval
//! - No sweep may run after the owning server stopped the monitor
//!
//! ### Situations covered
//! - Silent connection, heartbeating connection, already closed transport
//! - Paused-time runs across many intervals

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::domain::{ConnectionId, ConnectionRegistry};

pub struct HeartbeatMonitor {
    registry: Arc<dyn ConnectionRegistry>,
    interval: Duration,
}

impl HeartbeatMonitor {
    /// Create a new HeartbeatMonitor
    ///
    /// # Arguments
    ///
    /// * `registry` - Registry to sweep
    /// * `interval` - Time between sweeps; also the heartbeat window
    pub fn new(registry: Arc<dyn ConnectionRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one sweep and return the ids of terminated connections.
    pub async fn sweep(&self) -> Vec<ConnectionId> {
        let stale = self.registry.reap_stale().await;

        for handle in &stale {
            tracing::info!("Terminating connection '{}': missed heartbeat", handle.id);
            if !handle.terminate() {
                tracing::debug!("Connection '{}' already closed", handle.id);
            }
        }

        stale.into_iter().map(|handle| handle.id).collect()
    }

    /// Start sweeping in the background until `shutdown` is cancelled.
    ///
    /// The first sweep happens one full interval after the call.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!("Heartbeat monitor started (interval {:?})", self.interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::debug!("Heartbeat monitor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let terminated = self.sweep().await;
                    if !terminated.is_empty() {
                        tracing::info!("Heartbeat sweep terminated {} connection(s)", terminated.len());
                    }
                }
            }
        }
    }
}
