//! Real-time fan-out relay.
//!
//! Clients hold WebSocket connections and prove liveness with application-level
//! heartbeats; chat messages published over HTTP are broadcast to every open
//! connection.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
