//! UI layer: axum router, WebSocket connection actors and HTTP endpoints.

mod error;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ServerError;
pub use server::Server;
