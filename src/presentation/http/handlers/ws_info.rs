//! WebSocket Info Handlers
//!
//! Status and statistics for the WebSocket gateway. Read-only over the
//! registry: reporting never mutates gateway state.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::startup::AppState;

/// Gateway status report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketInfo {
    pub server_status: &'static str,
    pub server_port: u16,
    pub websocket_path: String,
    pub websocket_url: String,
    pub online_count: usize,
    pub online_users: Vec<String>,
}

/// Gateway statistics report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketStats {
    pub total_connections: usize,
    pub online_users: Vec<String>,
    pub server_info: ServerInfo,
}

/// Static server description
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub framework: &'static str,
    pub protocol: &'static str,
    pub features: [&'static str; 5],
}

/// `GET /api/websocket/info`
pub async fn info(State(state): State<AppState>) -> Json<WebSocketInfo> {
    let settings = &state.settings;
    Json(WebSocketInfo {
        server_status: "running",
        server_port: settings.server.port,
        websocket_path: settings.websocket.path.clone(),
        websocket_url: format!(
            "ws://{}:{}{}",
            settings.server.host, settings.server.port, settings.websocket.path
        ),
        online_count: state.gateway.online_count(),
        online_users: state.gateway.online_users(),
    })
}

/// `GET /api/websocket/stats`
pub async fn stats(State(state): State<AppState>) -> Json<WebSocketStats> {
    Json(WebSocketStats {
        total_connections: state.gateway.online_count(),
        online_users: state.gateway.online_users(),
        server_info: ServerInfo {
            framework: "axum",
            protocol: "WebSocket",
            features: [
                "broadcast chat",
                "private messages",
                "user registration",
                "heartbeat",
                "binary echo",
            ],
        },
    })
}
