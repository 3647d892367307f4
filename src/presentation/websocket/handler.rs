//! WebSocket Connection Handler
//!
//! Performs the upgrade handshake and runs one task per accepted
//! connection. Inbound frames for a connection are handled strictly
//! sequentially by its task; outbound frames are queued on the connection's
//! channel and drained by a writer task, so dispatch never blocks.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use super::gateway::Gateway;
use super::registry::ConnectionHandle;
use super::session::Session;
use crate::startup::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(state.settings.websocket.max_message_size)
        .max_frame_size(state.settings.websocket.max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state.gateway.clone()))
}

/// Handle one upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, gateway: Arc<Gateway>) {
    let (mut sink, mut stream) = socket.split();
    let (handle, mut outbound) = ConnectionHandle::new();
    let handle = Arc::new(handle);
    let connection_id = handle.id().to_string();

    tracing::debug!(connection_id = %connection_id, "New WebSocket connection");

    // Writer task: drain the outbound queue into the socket
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() {
                break;
            }
            if closing {
                break;
            }
        }
    });

    gateway.on_connect(Arc::clone(&handle));
    let mut session = Session::new(Arc::clone(&handle), Arc::clone(&gateway));

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => session.handle_text(text.as_str()),
            Ok(Message::Binary(data)) => session.handle_binary(data),
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Protocol-level pong replies are written by axum itself
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Close frame received");
                break;
            }
            Err(e) => {
                // Fail fast: a broken connection is torn down without
                // touching anyone else's session
                tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    session.close();
    writer.abort();
}
