//! WebSocket Gateway
//!
//! Envelope dispatch and connection lifecycle over the registry. The gateway
//! is shared by every connection task; none of its operations block, sends
//! are queued on the per-connection channel and flushed by the owning task.

use std::sync::Arc;

use axum::extract::ws::Message;

use super::messages::{Envelope, EnvelopeKind};
use super::registry::{ConnectionHandle, ConnectionRegistry};
use crate::infrastructure::metrics;

/// Gateway managing all live connections.
pub struct Gateway {
    registry: ConnectionRegistry,
}

impl Gateway {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Build an envelope stamped with the online count at this instant.
    ///
    /// One count per dispatch call: a broadcast's `onlineCount` may differ
    /// slightly from the number of connections that end up receiving it when
    /// connections churn mid-call. The registry only promises weak
    /// consistency here.
    pub fn envelope(
        &self,
        kind: EnvelopeKind,
        from: impl Into<String>,
        content: impl Into<String>,
    ) -> Envelope {
        Envelope::new(kind, from, content, self.registry.count())
    }

    /// Deliver to a single connection, silently dropping if it is closing.
    pub fn unicast(&self, handle: &ConnectionHandle, envelope: &Envelope) {
        handle.send(envelope.to_message());
    }

    /// Deliver to every live connection.
    pub fn broadcast_all(&self, envelope: &Envelope) {
        let message = envelope.to_message();
        self.registry.for_each_connection(|handle| {
            handle.send(message.clone());
        });
    }

    /// Deliver to every open connection except one; used for join and
    /// online notifications so a connection never sees its own.
    pub fn broadcast_except(&self, excluded_id: &str, envelope: &Envelope) {
        let message = envelope.to_message();
        self.registry.for_each_connection(|handle| {
            if handle.id() != excluded_id {
                handle.send(message.clone());
            }
        });
    }

    /// A connection completed the upgrade handshake: add it to the registry
    /// in anonymous state, welcome it, and tell everyone else.
    pub fn on_connect(&self, handle: Arc<ConnectionHandle>) {
        let connection_id = handle.id().to_string();
        self.registry.insert(Arc::clone(&handle));
        metrics::connection_opened();

        tracing::info!(connection_id = %connection_id, "New WebSocket connection");

        let welcome = self.envelope(
            EnvelopeKind::System,
            "connected",
            "welcome to the chat relay",
        );
        self.unicast(&handle, &welcome);

        let joined = self.envelope(
            EnvelopeKind::System,
            "user_joined",
            format!("a new user joined (connection {connection_id})"),
        );
        self.broadcast_except(&connection_id, &joined);
    }

    /// A connection closed (close frame or transport closure): drop its
    /// registry entries and, if an identity was bound, announce the leave to
    /// everyone remaining.
    pub fn on_disconnect(&self, handle: &ConnectionHandle) {
        let bound_user = self.registry.unbind(handle.id());
        self.registry.remove(handle.id());
        metrics::connection_closed();

        match bound_user {
            Some(user_id) => {
                tracing::info!(
                    user_id = %user_id,
                    connection_id = %handle.id(),
                    "User disconnected"
                );
                metrics::user_unregistered();

                let left = self.envelope(
                    EnvelopeKind::System,
                    "user_left",
                    format!("user {user_id} left the chat"),
                );
                self.broadcast_all(&left);
            }
            None => {
                tracing::info!(connection_id = %handle.id(), "Connection closed");
            }
        }
    }

    /// Number of live connections, for status reporting.
    pub fn online_count(&self) -> usize {
        self.registry.count()
    }

    /// Sorted registered-user snapshot, for status reporting.
    pub fn online_users(&self) -> Vec<String> {
        self.registry.snapshot_users()
    }

    /// Shutdown: queue a close frame to every live connection, then drop all
    /// registry entries. Called after the listener has stopped accepting, so
    /// nothing is left half-registered.
    pub fn close_all(&self) {
        self.registry.for_each_connection(|handle| {
            handle.send(Message::Close(None));
        });
        self.registry.clear();
        tracing::info!("All connections closed");
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}
