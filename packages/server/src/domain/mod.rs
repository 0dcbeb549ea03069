//! Domain layer: the envelope protocol, connections and the registry contract.
//!
//! Nothing in here knows about axum or JSON; the codec and the transport live
//! in the infrastructure and UI layers.

mod connection;
mod envelope;
mod error;
mod message;
mod registry;

pub use connection::{ConnectionChannel, ConnectionHandle, ConnectionId, Liveness, Outbound};
pub use envelope::{Envelope, ErrorCode, EventName, OpCode};
pub use error::InvalidContent;
pub use message::MessageContent;
pub use registry::ConnectionRegistry;
