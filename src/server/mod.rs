//! Server module for building the tours HTTP server
//!
//! This module provides a `ServerBuilder` that registers:
//! - the versioned tours and users routes
//! - health check routes
//! - optional static assets and request tracing

pub mod builder;
pub mod extract;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::ApiState;
pub use router::API_PREFIX;
