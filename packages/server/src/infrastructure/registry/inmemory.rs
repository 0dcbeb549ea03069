//! In-memory ConnectionRegistry backed by a `HashMap` behind a tokio mutex.
//!
//! Entries are keyed by opaque `ConnectionId`s, so a removal from one code path
//! never invalidates a snapshot another path is walking.

use std::collections::HashMap;

use async_trait::async_trait;
use hibiki_shared::time::now_millis;
use tokio::sync::Mutex;

use crate::domain::{ConnectionChannel, ConnectionHandle, ConnectionId, ConnectionRegistry, Liveness};

struct ConnectionEntry {
    channel: ConnectionChannel,
    liveness: Liveness,
    connected_at: i64,
}

impl ConnectionEntry {
    fn to_handle(&self, id: ConnectionId) -> ConnectionHandle {
        ConnectionHandle {
            id,
            channel: self.channel.clone(),
            liveness: self.liveness,
            connected_at: self.connected_at,
        }
    }
}

#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn add(&self, channel: ConnectionChannel) -> ConnectionId {
        let id = ConnectionId::generate();
        let entry = ConnectionEntry {
            channel,
            liveness: Liveness::Alive,
            connected_at: now_millis(),
        };
        self.connections.lock().await.insert(id, entry);
        tracing::debug!("Connection '{}' added to registry", id);
        id
    }

    async fn remove(&self, id: &ConnectionId) -> bool {
        let removed = self.connections.lock().await.remove(id).is_some();
        if removed {
            tracing::debug!("Connection '{}' removed from registry", id);
        }
        removed
    }

    async fn set_alive(&self, id: &ConnectionId, alive: bool) {
        if let Some(entry) = self.connections.lock().await.get_mut(id) {
            entry.liveness = Liveness::from(alive);
        }
    }

    async fn snapshot(&self) -> Vec<ConnectionHandle> {
        let connections = self.connections.lock().await;
        connections
            .iter()
            .map(|(id, entry)| entry.to_handle(*id))
            .collect()
    }

    async fn reap_stale(&self) -> Vec<ConnectionHandle> {
        let mut connections = self.connections.lock().await;
        let mut stale = Vec::new();
        connections.retain(|id, entry| match entry.liveness {
            Liveness::AwaitingPing => {
                stale.push(entry.to_handle(*id));
                false
            }
            Liveness::Alive => {
                entry.liveness = Liveness::AwaitingPing;
                true
            }
        });
        stale
    }

    async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }
}
