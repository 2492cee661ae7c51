use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod telemetry;
pub mod validation;

// Module for routing segregation (Public, Authenticated).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{RepositoryState, SqliteRepository};

/// ApiDoc
///
/// Auto-generated OpenAPI document, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login, handlers::get_me, handlers::update_me,
        handlers::get_claims, handlers::db_health
    ),
    components(
        schemas(
            models::User, models::RegisterUserRequest, models::LoginRequest,
            models::UpdateProfileRequest, models::AuthResponse, models::ClaimsResponse,
            models::DbStatus, models::ErrorBody,
        )
    ),
    tags(
        (name = "portal-api", description = "Account registration and authentication API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: the single, cloneable container holding the
/// services and configuration shared across all requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access.
    pub repo: RepositoryState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware, and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_auth,
            )),
        )
        // Every request: verify a bearer token if present and attach its claims.
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth::attach_claims,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`: method, URI and the `x-request-id` so every log line of one
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
