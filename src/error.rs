use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ErrorBody;

/// Field name -> human readable problem, as returned in a 422 body.
pub type FieldErrors = BTreeMap<String, String>;

/// ApiError
///
/// Every failure a handler or extractor can surface. `IntoResponse` turns it into a
/// status code plus an `ErrorBody` JSON document.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("authentication required")]
    Unauthorized,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("database unavailable")]
    Unavailable,

    #[error("internal server error")]
    Internal(String),

    /// A body axum could not turn into the handler's payload. Keeps axum's status
    /// (400, 415 or 422) and message.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details go to the log only.
        if let ApiError::Internal(detail) = &self {
            tracing::error!(%detail, "request failed");
        }

        let body = ErrorBody {
            error: self.to_string(),
            details: match self {
                ApiError::Validation(fields) => Some(fields),
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// RepositoryError
///
/// Failures of the persistence layer that callers need to tell apart.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} already registered")]
    Conflict(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(field) => {
                ApiError::Conflict(format!("{field} already registered"))
            }
            RepositoryError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// DbError
///
/// Failures of the connectivity handshake, one variant per stage.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("could not open database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("database did not answer the authentication query: {0}")]
    Authenticate(#[source] sqlx::Error),

    #[error("schema sync failed: {0}")]
    Sync(#[from] sqlx::migrate::MigrateError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "request body rejected");
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing: {err}"))
    }
}
