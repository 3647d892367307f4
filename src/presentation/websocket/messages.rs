//! WebSocket Message Types
//!
//! The application-level codec riding on text frames. Transport framing
//! (text/binary/ping/pong/close) is handled by axum's `ws` support; this
//! module only decodes text payloads into [`ClientMessage`] and serializes
//! outbound [`Envelope`]s.

use axum::extract::ws::Message;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::error::DecodeError;

/// Inbound client message, decoded once at the boundary.
///
/// The wire format is a JSON object dispatched on its `type` field:
///
/// ```json
/// {"type":"register","userId":"alice"}
/// {"type":"chat","content":"hello"}
/// {"type":"private","targetUserId":"bob","content":"hi"}
/// {"type":"ping"}
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Bind a user identity to this connection
    Register {
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Broadcast a chat message to every connection
    Chat { content: String },
    /// Deliver a message to a single registered user
    Private {
        #[serde(rename = "targetUserId")]
        target_user_id: String,
        content: String,
    },
    /// Application-level heartbeat
    Ping,
}

impl ClientMessage {
    /// Decode a text frame payload.
    ///
    /// Distinguishes two failure classes: a payload that cannot be parsed or
    /// is missing a required field (`parse_error`), and a well-formed payload
    /// whose `type` is not one of the known kinds (`unknown_type`).
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::Malformed("missing `type` field".into()))?;

        match kind {
            "register" | "chat" | "private" | "ping" => serde_json::from_value(value.clone())
                .map_err(|e| DecodeError::Malformed(e.to_string())),
            other => Err(DecodeError::UnknownType(other.to_string())),
        }
    }

    /// Message kind label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Register { .. } => "register",
            ClientMessage::Chat { .. } => "chat",
            ClientMessage::Private { .. } => "private",
            ClientMessage::Ping => "ping",
        }
    }
}

/// Outbound envelope kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    System,
    Chat,
    Private,
    Error,
}

/// Outbound message unit, constructed fresh per delivery.
///
/// `from` carries the sending user's identity for `chat`/`private` envelopes
/// and a short reason tag (`user_joined`, `pong`, `user_exists`, ...) for
/// `system`/`error` envelopes. `online_count` is a snapshot of the live
/// connection count taken when the envelope is built.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub from: String,
    pub content: String,
    pub timestamp: String,
    #[serde(rename = "onlineCount")]
    pub online_count: usize,
}

impl Envelope {
    /// Build an envelope stamped with the current time and the given
    /// online-count snapshot.
    pub fn new(
        kind: EnvelopeKind,
        from: impl Into<String>,
        content: impl Into<String>,
        online_count: usize,
    ) -> Self {
        Self {
            kind,
            from: from.into(),
            content: content.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            online_count,
        }
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize envelope");
            r#"{"type":"error","from":"serialize_error","content":"message serialization failed"}"#
                .to_string()
        })
    }

    /// Wrap into a text frame ready for the transport.
    pub fn to_message(&self) -> Message {
        Message::Text(self.to_json().into())
    }
}
