//! Fan-out relay server.
//!
//! Accepts WebSocket connections, keeps them alive with `op=10/11`
//! heartbeats and broadcasts messages posted to `/messages/new`.
//!
//! Run with:
//! ```not_rust
//! PORT=8080 HEARTBEAT=30000 cargo run --bin hibiki-server
//! cargo run --bin hibiki-server -- --port 8080 --heartbeat 30000
//! ```

use std::sync::Arc;

use clap::Parser;
use hibiki_server::{
    config::ServerConfig,
    domain::ConnectionRegistry,
    infrastructure::registry::InMemoryConnectionRegistry,
    ui::Server,
    usecase::{BroadcastPublisher, HeartbeatMonitor, ProtocolDispatcher},
};
use hibiki_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    setup_logger(&["hibiki_server", env!("CARGO_BIN_NAME")], "debug");

    let config = ServerConfig::parse();

    // Initialize dependencies in order:
    // 1. Registry
    // 2. UseCases
    // 3. Server

    // 1. Create Registry (in-memory)
    let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());

    // 2. Create UseCases
    let dispatcher = Arc::new(ProtocolDispatcher::new(registry.clone(), config.heartbeat));
    let publisher = Arc::new(BroadcastPublisher::new(registry.clone()));
    let monitor = Arc::new(HeartbeatMonitor::new(registry.clone(), config.heartbeat));

    // 3. Create and run the server
    let server = Server::new(registry, dispatcher, publisher, monitor);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
