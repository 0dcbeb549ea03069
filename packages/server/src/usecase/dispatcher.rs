//! UseCase: per-connection protocol handling.
//!
//! Registers new connections and greets them with the handshake, answers
//! client heartbeats and rejects everything else with `{error:4000}`. Rejection
//! never closes the connection.
//!
//! ## Test notes
//!
//! ### What is tested
//! - `on_connect`: registration and the handshake as the first queued frame
//! - `on_frame`: heartbeat acknowledgement and the allow-list rejection path
//! - `on_disconnect`: idempotent removal
//!
//! ### Why
//! - Every client-visible protocol reply originates here
//! - A rejected frame must leave the session registered and usable
//!
//! ### Situations covered
//! - Happy path: handshake, heartbeat, ack
//! - Errors: malformed JSON, unknown op, server-only opcodes sent by a client
//! - Edge cases: heartbeat after removal, handshake on an already closed channel

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{ConnectionChannel, ConnectionId, ConnectionRegistry, Envelope, Outbound},
    infrastructure::codec,
};

pub struct ProtocolDispatcher {
    registry: Arc<dyn ConnectionRegistry>,
    /// Heartbeat cadence announced in the handshake
    heartbeat: Duration,
}

impl ProtocolDispatcher {
    /// Create a new ProtocolDispatcher
    ///
    /// # Arguments
    ///
    /// * `registry` - Registry that owns every open connection
    /// * `heartbeat` - Interval announced to clients in the handshake
    pub fn new(registry: Arc<dyn ConnectionRegistry>, heartbeat: Duration) -> Self {
        Self {
            registry,
            heartbeat,
        }
    }

    /// Register a connection and queue the handshake as its first frame.
    pub async fn on_connect(&self, channel: ConnectionChannel) -> ConnectionId {
        let handshake = codec::encode(&Envelope::Handshake {
            heartbeat: self.heartbeat,
        });
        // queued before registration so no broadcast can overtake the handshake
        let queued = channel.send(Outbound::Frame(handshake)).is_ok();
        let id = self.registry.add(channel).await;
        if queued {
            tracing::info!("Connection '{}' registered, handshake queued", id);
        } else {
            tracing::debug!("Connection '{}' closed before handshake could be queued", id);
        }
        id
    }

    /// Handle one inbound frame and queue the reply on `channel`.
    ///
    /// # Arguments
    ///
    /// * `id` - Connection the frame arrived on
    /// * `channel` - That connection's outbound queue
    /// * `bytes` - Raw frame payload
    ///
    /// # Returns
    ///
    /// The reply envelope, for logging and tests.
    pub async fn on_frame(
        &self,
        id: &ConnectionId,
        channel: &ConnectionChannel,
        bytes: &[u8],
    ) -> Envelope {
        let reply = match codec::decode(bytes) {
            Ok(Envelope::Heartbeat) => {
                self.registry.set_alive(id, true).await;
                tracing::debug!("Heartbeat from '{}'", id);
                Envelope::HeartbeatAck
            }
            Ok(envelope) => {
                tracing::warn!(
                    "Rejected envelope with op {:?} from '{}'",
                    envelope.op().map(|op| op.code()),
                    id
                );
                Envelope::invalid_payload()
            }
            Err(e) => {
                tracing::warn!("Failed to decode frame from '{}': {}", id, e);
                Envelope::invalid_payload()
            }
        };

        if channel.send(Outbound::Frame(codec::encode(&reply))).is_err() {
            tracing::debug!("Connection '{}' closed before reply could be queued", id);
        }
        reply
    }

    /// Drop the connection from the registry. Safe to call after the monitor reaped it.
    pub async fn on_disconnect(&self, id: &ConnectionId) {
        if self.registry.remove(id).await {
            tracing::info!("Connection '{}' disconnected and removed from registry", id);
        } else {
            tracing::debug!("Connection '{}' was already removed", id);
        }
    }
}
