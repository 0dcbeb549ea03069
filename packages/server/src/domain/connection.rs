//! Connection identity, liveness and the outbound message channel.

use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque handle for a registered connection.
///
/// Handed out by the registry; holding one never keeps the connection alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Two-phase liveness used by the heartbeat monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Heartbeat seen since the last sweep (or freshly connected).
    Alive,
    /// Armed by the last sweep; terminated on the next one unless a heartbeat arrives.
    AwaitingPing,
}

impl Liveness {
    pub fn is_alive(self) -> bool {
        matches!(self, Self::Alive)
    }
}

impl From<bool> for Liveness {
    fn from(alive: bool) -> Self {
        if alive { Self::Alive } else { Self::AwaitingPing }
    }
}

/// Messages delivered to a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// An encoded envelope to write as a text frame.
    Frame(String),
    /// Close the transport; sent by the heartbeat monitor.
    Terminate,
}

/// Sending half of a connection's outbound queue.
pub type ConnectionChannel = mpsc::UnboundedSender<Outbound>;

/// Point-in-time view of a registry member.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub channel: ConnectionChannel,
    pub liveness: Liveness,
    /// Unix milliseconds at registration.
    pub connected_at: i64,
}

impl ConnectionHandle {
    /// Whether the writer task is still draining the channel.
    pub fn is_writable(&self) -> bool {
        !self.channel.is_closed()
    }

    /// Queue an encoded frame; returns `false` when the connection is gone.
    pub fn send_frame(&self, frame: String) -> bool {
        self.channel.send(Outbound::Frame(frame)).is_ok()
    }

    /// Ask the writer task to close the transport.
    pub fn terminate(&self) -> bool {
        self.channel.send(Outbound::Terminate).is_ok()
    }
}
