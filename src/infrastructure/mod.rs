//! Infrastructure Layer
//!
//! External-facing plumbing: metrics collection.

pub mod metrics;
