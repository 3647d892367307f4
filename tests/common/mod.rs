//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tower::ServiceExt;

use chat_relay::config::{CorsSettings, ServerSettings, Settings, WebSocketSettings};
use chat_relay::presentation::http::routes::create_router;
use chat_relay::presentation::websocket::Gateway;
use chat_relay::startup::{AppState, Application};

/// How long a test waits for an expected frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a test listens before declaring silence
pub const SILENCE_WINDOW: Duration = Duration::from_millis(300);

/// Settings for tests: loopback host, caller-chosen port (0 = ephemeral)
pub fn test_settings(port: u16) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port,
        },
        websocket: WebSocketSettings {
            path: "/ws".into(),
            max_message_size: 65536,
            max_frame_size: 16384,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        environment: "test".into(),
    }
}

/// In-process application for request/response tests (no network)
pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<Gateway>,
}

impl TestApp {
    pub fn new() -> Self {
        let gateway = Arc::new(Gateway::new());
        let state = AppState {
            gateway: Arc::clone(&gateway),
            settings: Arc::new(test_settings(9999)),
        };
        Self {
            router: create_router(state),
            gateway,
        }
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// GET a JSON body
    pub async fn get_json(&self, uri: &str) -> serde_json::Value {
        let response = self.get(uri).await;
        assert!(response.status().is_success(), "GET {uri} failed");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }
}

/// A relay server bound to an ephemeral loopback port
pub struct TestServer {
    pub addr: SocketAddr,
    ws_path: String,
}

/// Spawn the full application on an ephemeral port
pub async fn spawn_app() -> TestServer {
    let settings = test_settings(0);
    let ws_path = settings.websocket.path.clone();
    let app = Application::build(settings)
        .await
        .expect("failed to bind test server");
    let addr = app.local_addr().expect("bound address");
    tokio::spawn(app.run_until_stopped());
    TestServer { addr, ws_path }
}

impl TestServer {
    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.ws_path)
    }
}

/// WebSocket test client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(server: &TestServer) -> Self {
        let (stream, _response) = connect_async(server.ws_url())
            .await
            .expect("websocket handshake failed");
        Self { stream }
    }

    /// Connect and consume the connect-time welcome envelope
    pub async fn connect_and_welcome(server: &TestServer) -> Self {
        let mut client = Self::connect(server).await;
        let welcome = client.recv_envelope().await;
        assert_eq!(welcome["type"], "system");
        assert_eq!(welcome["from"], "connected");
        client
    }

    pub async fn send_json(&mut self, payload: serde_json::Value) {
        self.send_text(&payload.to_string()).await;
    }

    pub async fn send_text(&mut self, text: &str) {
        self.stream
            .send(Message::text(text))
            .await
            .expect("send failed");
    }

    pub async fn send_binary(&mut self, bytes: Vec<u8>) {
        self.stream
            .send(Message::Binary(bytes.into()))
            .await
            .expect("send failed");
    }

    pub async fn send_ping(&mut self, payload: Vec<u8>) {
        self.stream
            .send(Message::Ping(payload.into()))
            .await
            .expect("send failed");
    }

    /// Next frame, failing the test if none arrives in time
    pub async fn recv(&mut self) -> Message {
        tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("websocket error")
    }

    /// Next text frame parsed as an envelope, skipping control frames
    pub async fn recv_envelope(&mut self) -> serde_json::Value {
        loop {
            match self.recv().await {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_str()).expect("invalid envelope json")
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    }

    /// Next binary frame, skipping control frames
    pub async fn recv_binary(&mut self) -> Vec<u8> {
        loop {
            match self.recv().await {
                Message::Binary(data) => return data.to_vec(),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("expected binary frame, got {other:?}"),
            }
        }
    }

    /// Assert that no frame at all arrives within the silence window
    pub async fn assert_silent(&mut self) {
        if let Ok(frame) = tokio::time::timeout(SILENCE_WINDOW, self.stream.next()).await {
            panic!("expected silence, got {frame:?}");
        }
    }

    /// Register an identity and consume the success + roster envelopes
    pub async fn register(&mut self, user_id: &str) {
        self.send_json(serde_json::json!({"type": "register", "userId": user_id}))
            .await;
        let success = self.recv_envelope().await;
        assert_eq!(success["from"], "register_success", "register failed: {success}");
        let roster = self.recv_envelope().await;
        assert_eq!(roster["from"], "online_users");
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
