use std::time::Instant;

use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    models::{
        AuthResponse, ClaimsResponse, DbStatus, ErrorBody, LoginRequest, NewUser,
        RegisterUserRequest, UpdateProfileRequest, User,
    },
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use uuid::Uuid;

/// Builds the body shared by registration and login.
fn auth_response(user: User, state: &AppState) -> Result<AuthResponse, ApiError> {
    let (token, expires_in) = auth::issue_token(&user, &state.config)?;
    Ok(AuthResponse {
        user,
        token,
        token_type: "Bearer".to_string(),
        expires_in,
    })
}

/// bcrypt is deliberately slow; keep it off the async workers.
async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task: {e}")))?
        .map_err(ApiError::from)
}

async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("verify task: {e}")))?
        .map_err(ApiError::from)
}

// --- Handlers ---

/// register_user
///
/// [Public Route] Creates an account and signs a token for it.
///
/// *Flow*: validate and normalize the payload, hash the password, insert. Email and
/// username uniqueness is decided by the store and surfaces as 409.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Body is not JSON", body = ErrorBody),
        (status = 409, description = "Email or username taken", body = ErrorBody),
        (status = 422, description = "Invalid or missing fields", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    body: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = body?;
    let payload = payload.validate().map_err(|fields| {
        tracing::debug!(?fields, "registration rejected");
        ApiError::Validation(fields)
    })?;

    let password_hash = hash_password(payload.password, state.config.bcrypt_cost).await?;

    let new_user = NewUser {
        id: Uuid::new_v4(),
        email: payload.email,
        username: payload.username,
        first_name: payload.first_name,
        last_name: payload.last_name,
        address: payload.address,
        telephone: payload.telephone,
        password_hash,
    };

    let user = state.repo.create_user(new_user).await.map_err(|e| {
        tracing::warn!("registration failed: {}", e);
        ApiError::from(e)
    })?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    Ok((StatusCode::CREATED, Json(auth_response(user, &state)?)))
}

/// login
///
/// [Public Route] Exchanges email-or-username plus password for a token. Unknown
/// accounts and wrong passwords produce the same 401.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = body?;
    let login = payload.login.trim();

    let Some(record) = state.repo.find_credentials(login).await? else {
        tracing::warn!(login, "login for unknown account");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(payload.password, record.password_hash).await? {
        tracing::warn!(user_id = %record.user.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    tracing::info!(user_id = %record.user.id, "user logged in");
    Ok(Json(auth_response(record.user, &state)?))
}

/// get_me
///
/// [Authenticated Route] The authenticated user's profile.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile", body = User),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    state.repo.get_user(id).await.map(Json).ok_or(ApiError::NotFound)
}

/// get_claims
///
/// [Authenticated Route] Echoes the token payload of the principal that `AuthUser`
/// resolved, so it always agrees with GET /me.
#[utoipa::path(
    get,
    path = "/me/claims",
    responses(
        (status = 200, description = "Attached claims", body = ClaimsResponse),
        (status = 401, description = "No bearer token on this request", body = ErrorBody)
    )
)]
pub async fn get_claims(auth_user: AuthUser) -> Result<Json<ClaimsResponse>, ApiError> {
    // The x-user-id bypass authenticates without a token, so there may be nothing to show.
    let claims = auth_user.claims.ok_or(ApiError::Unauthorized)?;
    Ok(Json(ClaimsResponse {
        sub: claims.sub,
        username: claims.username,
        iat: claims.iat as u64,
        exp: claims.exp as u64,
    }))
}

/// update_me
///
/// [Authenticated Route] Partial update of the caller's own profile.
#[utoipa::path(
    put,
    path = "/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 422, description = "Invalid fields", body = ErrorBody)
    )
)]
pub async fn update_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(payload) = body?;
    let payload = payload.validate().map_err(ApiError::Validation)?;

    // Nothing to change: leave updated_at alone.
    if payload.is_empty() {
        return state.repo.get_user(id).await.map(Json).ok_or(ApiError::NotFound);
    }

    match state.repo.update_profile(id, payload).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::NotFound),
    }
}

/// db_health
///
/// [Public Route] Runs the authentication query against the store.
#[utoipa::path(
    get,
    path = "/health/db",
    responses(
        (status = 200, description = "Database reachable", body = DbStatus),
        (status = 503, description = "Database unavailable", body = ErrorBody)
    )
)]
pub async fn db_health(State(state): State<AppState>) -> Result<Json<DbStatus>, ApiError> {
    let started = Instant::now();
    state.repo.ping().await.map_err(|e| {
        tracing::error!("database ping failed: {}", e);
        ApiError::Unavailable
    })?;

    Ok(Json(DbStatus {
        status: "ok".to_string(),
        latency_ms: started.elapsed().as_millis() as u64,
    }))
}
