//! UseCase layer: connection protocol, broadcast and liveness sweeps.

mod dispatcher;
mod error;
mod heartbeat_monitor;
mod publish_message;

pub use dispatcher::ProtocolDispatcher;
pub use error::PublishError;
pub use heartbeat_monitor::HeartbeatMonitor;
pub use publish_message::BroadcastPublisher;
