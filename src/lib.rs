//! # Chat Relay
//!
//! A real-time WebSocket message relay server with:
//! - Broadcast, private, and system message routing between connections
//! - Client-chosen user identity registration with uniqueness enforcement
//! - Application-level heartbeat and binary echo probes
//! - HTTP status endpoints for gateway introspection
//!
//! ## Architecture
//!
//! The crate follows a layered structure:
//!
//! - **Infrastructure Layer**: Metrics and other external-facing plumbing
//! - **Presentation Layer**: HTTP handlers and the WebSocket gateway
//! - **Shared**: Common utilities (error types)
//!
//! ## Module Structure
//!
//! ```text
//! chat_relay/
//! +-- config/        Configuration management
//! +-- infrastructure/ Metrics collection
//! +-- presentation/  HTTP routes and WebSocket gateway
//! +-- shared/        Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
