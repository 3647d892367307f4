//! Application Error Types
//!
//! Centralized error handling for the relay.
//!
//! Errors in the gateway protocol are never fatal to the process: protocol,
//! state, and routing errors are reported back to the offending connection as
//! `error` envelopes and the session continues. The only startup-fatal
//! condition is the listener failing to bind its port, which is propagated as
//! `anyhow::Error` out of `Application::build`.

use thiserror::Error;

/// Failure to decode an inbound text frame into a client message.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Unparseable JSON, missing `type` tag, or a missing required field.
    #[error("invalid message: {0}")]
    Malformed(String),

    /// Well-formed JSON whose `type` is not a known message kind.
    #[error("unknown message type: {0}")]
    UnknownType(String),
}

impl DecodeError {
    /// Machine-readable reason tag carried in the `from` field of the
    /// resulting `error` envelope.
    pub fn reason(&self) -> &'static str {
        match self {
            DecodeError::Malformed(_) => "parse_error",
            DecodeError::UnknownType(_) => "unknown_type",
        }
    }
}

/// Failure to bind a user identity to a connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    /// The identity is already bound to a live connection.
    #[error("user id already taken: {0}")]
    UserExists(String),
}
