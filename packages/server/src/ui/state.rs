//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::{
    domain::ConnectionRegistry,
    usecase::{BroadcastPublisher, ProtocolDispatcher},
};

pub struct AppState {
    /// Registry (read-only here, for health and diagnostics)
    pub registry: Arc<dyn ConnectionRegistry>,
    pub dispatcher: Arc<ProtocolDispatcher>,
    pub publisher: Arc<BroadcastPublisher>,
}
