//! WebSocket Info API Tests
//!
//! The status endpoints read the registry without mutating it.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use chat_relay::presentation::websocket::ConnectionHandle;

use crate::common::TestApp;

#[tokio::test]
async fn info_reports_an_empty_gateway() {
    let app = TestApp::new();

    let body = app.get_json("/api/websocket/info").await;

    assert_eq!(body["serverStatus"], "running");
    assert_eq!(body["serverPort"], 9999);
    assert_eq!(body["websocketPath"], "/ws");
    assert_eq!(body["websocketUrl"], "ws://127.0.0.1:9999/ws");
    assert_eq!(body["onlineCount"], 0);
    assert_eq!(body["onlineUsers"], serde_json::json!([]));
}

#[tokio::test]
async fn info_reflects_live_connections_without_mutating_them() {
    let app = TestApp::new();

    let (alice, _alice_rx) = ConnectionHandle::new();
    let alice = Arc::new(alice);
    app.gateway.on_connect(Arc::clone(&alice));
    app.gateway.registry().bind_user(&alice, "alice").unwrap();

    let (anon, _anon_rx) = ConnectionHandle::new();
    app.gateway.on_connect(Arc::new(anon));

    let body = app.get_json("/api/websocket/info").await;
    assert_eq!(body["onlineCount"], 2);
    assert_eq!(body["onlineUsers"], serde_json::json!(["alice"]));

    // Reading twice yields the same picture: reporting is side-effect free
    let again = app.get_json("/api/websocket/info").await;
    assert_eq!(again["onlineCount"], 2);
    assert_eq!(again["onlineUsers"], serde_json::json!(["alice"]));
}

#[tokio::test]
async fn stats_describes_the_server() {
    let app = TestApp::new();

    let body = app.get_json("/api/websocket/stats").await;

    assert_eq!(body["totalConnections"], 0);
    assert_eq!(body["serverInfo"]["framework"], "axum");
    assert_eq!(body["serverInfo"]["protocol"], "WebSocket");
    assert!(body["serverInfo"]["features"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "binary echo"));
}
