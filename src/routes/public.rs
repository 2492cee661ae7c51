use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that are **unauthenticated** and accessible to any client.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // GET /health/db
        // Runs `SELECT 1` against the store; 503 when it does not answer.
        .route("/health/db", get(handlers::db_health))
        // POST /register
        // Account creation. Returns the new user and a bearer token.
        .route("/register", post(handlers::register_user))
        // POST /login
        // Exchanges email-or-username and password for a bearer token.
        .route("/login", post(handlers::login))
}
