//! Configuration
//!
//! Application settings loaded from files and environment variables.

pub mod settings;

pub use settings::{CorsSettings, ServerSettings, Settings, WebSocketSettings};
