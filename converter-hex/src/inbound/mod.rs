//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the application layer.

pub mod auth;
mod correlation;
pub mod handlers;
pub mod rate_limit;
mod server;

pub use auth::{JwtOptions, JwtTokenService, Policy, Principal};
pub use handlers::AppState;
pub use server::{HttpServer, ServerOptions};
