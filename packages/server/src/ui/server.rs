//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::{
    domain::ConnectionRegistry,
    usecase::{BroadcastPublisher, HeartbeatMonitor, ProtocolDispatcher},
};

use super::{
    error::ServerError,
    handler::{
        http::{debug_connections, health_check, publish_message},
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Fan-out relay server
///
/// Owns the registry, the heartbeat monitor and (while running) the listener.
/// Constructed once at startup and consumed by `run`/`serve`; the monitor is
/// started with the listener and cancelled when serving stops.
///
/// # Example
///
/// ```ignore
/// let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());
/// let server = Server::new(
///     registry.clone(),
///     Arc::new(ProtocolDispatcher::new(registry.clone(), heartbeat)),
///     Arc::new(BroadcastPublisher::new(registry.clone())),
///     Arc::new(HeartbeatMonitor::new(registry, heartbeat)),
/// );
/// server.run("0.0.0.0".to_string(), 8080).await?;
/// ```
pub struct Server {
    registry: Arc<dyn ConnectionRegistry>,
    dispatcher: Arc<ProtocolDispatcher>,
    publisher: Arc<BroadcastPublisher>,
    monitor: Arc<HeartbeatMonitor>,
}

impl Server {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        dispatcher: Arc<ProtocolDispatcher>,
        publisher: Arc<BroadcastPublisher>,
        monitor: Arc<HeartbeatMonitor>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            publisher,
            monitor,
        }
    }

    /// Build the router. The WebSocket endpoint is served on both `/` and `/ws`.
    ///
    /// Every HTTP response carries `nosniff`, `SAMEORIGIN` framing and
    /// `no-referrer` headers unless a handler already set them.
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            registry: self.registry.clone(),
            dispatcher: self.dispatcher.clone(),
            publisher: self.publisher.clone(),
        });

        Router::new()
            // WebSocket endpoints
            .route("/", get(websocket_handler))
            .route("/ws", get(websocket_handler))
            // HTTP endpoints
            .route("/messages/new", post(publish_message))
            .route("/api/health", get(health_check))
            .route("/debug/connections", get(debug_connections))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Bind `host:port` and serve until Ctrl+C / SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(self, host: String, port: u16) -> Result<(), ServerError> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;

        tracing::info!("Connect to: ws://{}", bind_addr);
        tracing::info!("Publish with: POST http://{}/messages/new", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// On return the heartbeat monitor has stopped and every connection still
    /// registered has been told to close.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Relay server listening on {}", addr);
        }

        let monitor_token = CancellationToken::new();
        let monitor_task = self.monitor.clone().spawn(monitor_token.clone());
        tracing::info!(
            "Heartbeat monitor running every {:?}",
            self.monitor.interval()
        );

        // WebSocket connections are told to close as soon as shutdown is requested.
        let registry = self.registry.clone();
        let shutdown = async move {
            shutdown.await;
            tracing::info!("Shutdown requested, closing connections");
            close_all(registry.as_ref()).await;
        };

        let app = self.router();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        monitor_token.cancel();
        if let Err(e) = monitor_task.await {
            tracing::warn!("Heartbeat monitor ended abnormally: {}", e);
        }

        // Anything that registered while the listener was draining.
        close_all(self.registry.as_ref()).await;

        tracing::info!("Server shutdown complete");
        result.map_err(ServerError::Serve)
    }
}

/// Terminate and deregister every connection currently in `registry`.
async fn close_all(registry: &dyn ConnectionRegistry) {
    for handle in registry.snapshot().await {
        if handle.terminate() {
            tracing::debug!("Closing connection '{}' for shutdown", handle.id);
        }
        registry.remove(&handle.id).await;
    }
}
