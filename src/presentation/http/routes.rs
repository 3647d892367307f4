//! Route Configuration
//!
//! Configures all HTTP routes for the relay.

use axum::{response::IntoResponse, routing::get, Router};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // The upgrade path is configurable (default "/ws")
    let ws_path = state.settings.websocket.path.clone();

    Router::new()
        // WebSocket gateway endpoint
        .route(&ws_path, get(ws_handler))
        // Gateway status endpoints
        .nest("/api/websocket", info_routes())
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// Gateway status routes
fn info_routes() -> Router<AppState> {
    Router::new()
        .route("/info", get(handlers::ws_info::info))
        .route("/stats", get(handlers::ws_info::stats))
}
