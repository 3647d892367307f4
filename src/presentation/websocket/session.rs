//! WebSocket Session
//!
//! Per-connection state machine. A session is owned by its connection task
//! and driven strictly sequentially, one inbound frame at a time; everything
//! it shares with other sessions goes through the gateway's registry.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::Message;

use super::gateway::Gateway;
use super::messages::{ClientMessage, Envelope, EnvelopeKind};
use super::registry::ConnectionHandle;
use crate::infrastructure::metrics;
use crate::shared::error::RegisterError;

/// Session lifecycle state.
///
/// `Closed` is terminal and entered exactly once; at that point the
/// connection has been removed from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unregistered,
    Registered(String),
    Closed,
}

/// One session per connection.
pub struct Session {
    connection: Arc<ConnectionHandle>,
    gateway: Arc<Gateway>,
    state: SessionState,
}

impl Session {
    pub fn new(connection: Arc<ConnectionHandle>, gateway: Arc<Gateway>) -> Self {
        Self {
            connection,
            gateway,
            state: SessionState::Unregistered,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Interpret one inbound text frame.
    ///
    /// Protocol, state, and routing errors are reported back to this
    /// connection only and never mutate session or registry state.
    pub fn handle_text(&mut self, text: &str) {
        if self.state == SessionState::Closed {
            return;
        }

        let message = match ClientMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(
                    connection_id = %self.connection.id(),
                    error = %e,
                    "Undecodable message"
                );
                metrics::record_message(e.reason());
                self.send_error(e.reason(), e.to_string());
                return;
            }
        };

        metrics::record_message(message.kind());
        match message {
            ClientMessage::Register { user_id } => self.handle_register(user_id),
            ClientMessage::Chat { content } => self.handle_chat(content),
            ClientMessage::Private {
                target_user_id,
                content,
            } => self.handle_private(target_user_id, content),
            ClientMessage::Ping => self.handle_ping(),
        }
    }

    /// Echo a binary frame back to the sender, verbatim and exactly once.
    /// Used by clients as a connectivity and size probe; never broadcast.
    pub fn handle_binary(&mut self, data: Bytes) {
        if self.state == SessionState::Closed {
            return;
        }
        tracing::debug!(
            connection_id = %self.connection.id(),
            size = data.len(),
            "Binary message echoed"
        );
        metrics::record_message("binary");
        self.connection.send(Message::Binary(data));
    }

    /// Enter the terminal state and release registry entries. Idempotent.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.gateway.on_disconnect(&self.connection);
    }

    fn handle_register(&mut self, user_id: String) {
        match &self.state {
            SessionState::Closed => {}
            SessionState::Registered(current) => {
                self.send_error(
                    "already_registered",
                    format!("already registered as {current}"),
                );
            }
            SessionState::Unregistered => {
                match self.gateway.registry().bind_user(&self.connection, &user_id) {
                    Err(RegisterError::UserExists(_)) => {
                        self.send_error("user_exists", format!("user id already taken: {user_id}"));
                    }
                    Ok(()) => {
                        self.state = SessionState::Registered(user_id.clone());
                        metrics::user_registered();
                        tracing::info!(
                            user_id = %user_id,
                            connection_id = %self.connection.id(),
                            "User registered"
                        );

                        let success = self.gateway.envelope(
                            EnvelopeKind::System,
                            "register_success",
                            format!("registered successfully, welcome {user_id}"),
                        );
                        self.gateway.unicast(&self.connection, &success);

                        let online = self.gateway.envelope(
                            EnvelopeKind::System,
                            "user_online",
                            format!("user {user_id} is now online"),
                        );
                        self.gateway.broadcast_except(self.connection.id(), &online);

                        let roster = self.gateway.registry().snapshot_users().join(", ");
                        let listing = self.gateway.envelope(
                            EnvelopeKind::System,
                            "online_users",
                            format!("online users: {roster}"),
                        );
                        self.gateway.unicast(&self.connection, &listing);
                    }
                }
            }
        }
    }

    fn handle_chat(&mut self, content: String) {
        let Some(user_id) = self.registered_user("chat") else {
            return;
        };
        tracing::debug!(user_id = %user_id, "Chat message");
        let envelope = self.gateway.envelope(EnvelopeKind::Chat, user_id, content);
        self.gateway.broadcast_all(&envelope);
    }

    fn handle_private(&mut self, target_user_id: String, content: String) {
        let Some(user_id) = self.registered_user("private") else {
            return;
        };

        let Some(target) = self.gateway.registry().connection_for_user(&target_user_id) else {
            self.send_error(
                "user_not_found",
                format!("user is not online: {target_user_id}"),
            );
            return;
        };

        tracing::debug!(
            user_id = %user_id,
            target_user_id = %target_user_id,
            "Private message"
        );
        let envelope = self
            .gateway
            .envelope(EnvelopeKind::Private, user_id, content);
        self.gateway.unicast(&target, &envelope);

        let confirmation = self.gateway.envelope(
            EnvelopeKind::System,
            "private_sent",
            format!("private message delivered to {target_user_id}"),
        );
        self.gateway.unicast(&self.connection, &confirmation);
    }

    fn handle_ping(&mut self) {
        let pong = self
            .gateway
            .envelope(EnvelopeKind::System, "pong", "server is online");
        self.gateway.unicast(&self.connection, &pong);
    }

    /// The bound identity, or an error envelope to the requester if the
    /// session has not registered yet.
    fn registered_user(&self, action: &str) -> Option<String> {
        match &self.state {
            SessionState::Registered(user_id) => Some(user_id.clone()),
            _ => {
                tracing::debug!(
                    connection_id = %self.connection.id(),
                    action = action,
                    "Rejected action from unregistered session"
                );
                self.send_error("not_registered", "register a user id first");
                None
            }
        }
    }

    fn send_error(&self, reason: &str, content: impl Into<String>) {
        let envelope = Envelope::new(
            EnvelopeKind::Error,
            reason,
            content,
            self.gateway.online_count(),
        );
        self.gateway.unicast(&self.connection, &envelope);
    }
}
