//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Active WebSocket connection gauge
//! - Registered user gauge
//! - Inbound message counts by kind

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Active WebSocket connections gauge
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "ws_connections_active",
            "Number of active WebSocket connections",
        )
        .namespace("chat_relay"),
    )
    .expect("Failed to create WS_CONNECTIONS_ACTIVE metric")
});

/// Registered users gauge
pub static WS_USERS_REGISTERED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "ws_users_registered",
            "Number of connections with a bound user identity",
        )
        .namespace("chat_relay"),
    )
    .expect("Failed to create WS_USERS_REGISTERED metric")
});

/// Inbound message counter - tracks messages by kind
pub static WS_MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ws_messages_total", "Total inbound WebSocket messages")
            .namespace("chat_relay"),
        &["kind"],
    )
    .expect("Failed to create WS_MESSAGES_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register WS_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(WS_USERS_REGISTERED.clone()))
        .expect("Failed to register WS_USERS_REGISTERED");
    registry
        .register(Box::new(WS_MESSAGES_TOTAL.clone()))
        .expect("Failed to register WS_MESSAGES_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// A connection completed the upgrade handshake
pub fn connection_opened() {
    WS_CONNECTIONS_ACTIVE.inc();
}

/// A connection closed
pub fn connection_closed() {
    WS_CONNECTIONS_ACTIVE.dec();
}

/// A connection bound a user identity
pub fn user_registered() {
    WS_USERS_REGISTERED.inc();
}

/// A registered connection went away
pub fn user_unregistered() {
    WS_USERS_REGISTERED.dec();
}

/// Record one inbound message by kind ("register", "chat", "private",
/// "ping", "binary", "parse_error", "unknown_type")
pub fn record_message(kind: &str) {
    WS_MESSAGES_TOTAL.with_label_values(&[kind]).inc();
}
