pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod database;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod rate_limit;
pub mod routes;

// Re-export key functions for convenience
pub use app::{AppState, build_router, create_app, init_tracing};
