//! Data Transfer Objects
//!
//! Serde shapes for the WebSocket envelope and the HTTP API. Domain types are
//! converted to and from these at the edges.

pub mod envelope;
pub mod http;
