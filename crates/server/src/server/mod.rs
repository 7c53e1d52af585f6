//! HTTP(S) server, routing, and middleware.
//!
//! # Responsibilities
//! - Build and bind the TLS listener (rustls) when certificates are configured.
//! - Define the Axum router with all routes and shared middleware.
//! - Inject shared application state (`AppState`) into handlers.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod tls;
