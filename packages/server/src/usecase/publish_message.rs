//! UseCase: broadcast a chat message to every open connection.
//!
//! The envelope is encoded once and the same text is queued on each
//! connection. Delivery is best-effort and at most once per recipient: a
//! connection whose writer has already stopped is skipped, nothing is retried.
//!
//! ## Test notes
//!
//! ### What is tested
//! - `publish`: content validation and fan-out to the registry snapshot
//!
//! ### Why
//! - Validation failures must not touch any connection
//! - Each open connection receives the event exactly once per call
//!
//! ### Situations covered
//! - Errors: empty and missing content
//! - Happy path: several recipients, per-connection ordering across calls
//! - Edge cases: a member whose writer already stopped, an empty registry

use std::sync::Arc;

use crate::{
    domain::{ConnectionHandle, ConnectionRegistry, Envelope, MessageContent},
    infrastructure::codec,
};

use super::error::PublishError;

pub struct BroadcastPublisher {
    registry: Arc<dyn ConnectionRegistry>,
}

impl BroadcastPublisher {
    /// Create a new BroadcastPublisher
    ///
    /// # Arguments
    ///
    /// * `registry` - Registry whose members receive every broadcast
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Publish `content` as a `MESSAGE_CREATED` event.
    ///
    /// # Arguments
    ///
    /// * `content` - Chat message body; `None` when the caller supplied none
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - number of connections the event was queued on
    /// * `Err(PublishError::InvalidContent)` - content missing or empty
    pub async fn publish(&self, content: Option<String>) -> Result<usize, PublishError> {
        let content = MessageContent::try_from(content)?;
        let frame = codec::encode(&Envelope::MessageCreated { content });

        let mut delivered = 0;
        self.registry
            .for_each(&mut |handle: &ConnectionHandle| {
                if !handle.is_writable() {
                    return;
                }
                if handle.send_frame(frame.clone()) {
                    delivered += 1;
                } else {
                    tracing::debug!(
                        "Connection '{}' closed during broadcast, skipping",
                        handle.id
                    );
                }
            })
            .await;

        tracing::info!("Broadcasted MESSAGE_CREATED to {} connection(s)", delivered);
        Ok(delivered)
    }
}
