//! WebSocket connection handlers.
//!
//! Each connection runs as two tasks: a reader that feeds inbound frames to
//! the dispatcher, and a writer that drains the connection's outbound queue.
//! Whichever finishes first aborts the other, then the connection is
//! unregistered.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{domain::Outbound, ui::state::AppState};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns the writer task for one connection.
///
/// Frames are written in queue order; `Outbound::Terminate` sends a close
/// frame and ends the task, which tears the connection down.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Frame(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Outbound::Terminate => {
                    let close = CloseFrame {
                        code: close_code::AWAY,
                        reason: "connection terminated".into(),
                    };
                    let _ = sender.send(Message::Close(Some(close))).await;
                    break;
                }
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let id = state.dispatcher.on_connect(tx.clone()).await;

    let mut send_task = pusher_loop(rx, sender);

    let dispatcher = state.dispatcher.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text from '{}': {}", id, text.as_str());
                    dispatcher.on_frame(&id, &tx, text.as_str().as_bytes()).await;
                }
                Message::Binary(bytes) => {
                    dispatcher.on_frame(&id, &tx, &bytes).await;
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // control frames never count as heartbeats
                    tracing::trace!("Control frame from '{}'", id);
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", id);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.dispatcher.on_disconnect(&id).await;
}
