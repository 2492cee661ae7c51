use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every handler here runs behind the `require_auth` route layer, so it always receives
/// a resolved `AuthUser` whose id is used for owner-only access.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/PUT /me
        // Read or partially update the caller's own profile.
        .route("/me", get(handlers::get_me).put(handlers::update_me))
        // GET /me/claims
        // The decoded token payload attached to this request.
        .route("/me/claims", get(handlers::get_claims))
}
