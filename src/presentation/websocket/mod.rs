//! WebSocket Gateway
//!
//! Real-time message relay over WebSocket connections.

pub mod gateway;
pub mod handler;
pub mod messages;
pub mod registry;
pub mod session;

pub use gateway::Gateway;
pub use handler::ws_handler;
pub use messages::{ClientMessage, Envelope, EnvelopeKind};
pub use registry::{ConnectionHandle, ConnectionRegistry};
pub use session::{Session, SessionState};
