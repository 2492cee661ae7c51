use crate::{
    error::RepositoryError,
    models::{NewUser, UpdateProfileRequest, User, UserRecord},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers and the `AuthUser`
/// extractor only see this trait, so tests can swap in a mock.
///
/// **Send + Sync + async_trait** are required to share the trait object
/// (`Arc<dyn Repository>`) across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Trivial round-trip used by the database health check.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // --- User/Auth ---
    // Errors are logged and reported as "no such user".
    async fn get_user(&self, id: Uuid) -> Option<User>;
    // Looks up by email (case-insensitive) or by username.
    async fn find_credentials(&self, login: &str) -> Result<Option<UserRecord>, RepositoryError>;
    // Fails with `Conflict` when the email or username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    // --- Owner Actions ---
    // Partial update; `Ok(None)` when the user does not exist.
    async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<User>, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str =
    "id, email, username, first_name, last_name, address, telephone, created_at, updated_at";

/// SqliteRepository
///
/// `Repository` backed by the file-based SQLite store.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Maps a unique-constraint failure onto the column that caused it.
/// SQLite reports these as `UNIQUE constraint failed: users.<column>`.
fn conflict_field(err: &sqlx::Error) -> Option<&'static str> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    if db_err.message().contains("users.username") {
        Some("username")
    } else {
        Some("email")
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        crate::db::authenticate(&self.pool).await?;
        Ok(())
    }

    /// get_user
    ///
    /// Resolves the public profile for an id. Used by the `AuthUser` extractor on every
    /// authenticated request.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    /// find_credentials
    ///
    /// Fetches the row including the password hash for the login flow. Emails are stored
    /// lowercased with full Unicode folding, which `COLLATE NOCASE` alone does not do.
    async fn find_credentials(&self, login: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let email = login.to_lowercase();
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users \
             WHERE email = ? COLLATE NOCASE OR username = ? LIMIT 1"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(&email)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// create_user
    ///
    /// Inserts the account and returns its public view. Uniqueness of email and username
    /// is enforced by the schema; a violation becomes `RepositoryError::Conflict`.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (id, email, username, first_name, last_name, address, telephone, \
             password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.address)
            .bind(&user.telephone)
            .bind(&user.password_hash)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match conflict_field(&e) {
                Some(field) => RepositoryError::Conflict(field),
                None => RepositoryError::Database(e),
            })
    }

    /// update_profile
    ///
    /// Uses `COALESCE` so only the provided fields change.
    async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "UPDATE users \
             SET first_name = COALESCE(?, first_name), \
                 last_name = COALESCE(?, last_name), \
                 address = COALESCE(?, address), \
                 telephone = COALESCE(?, telephone), \
                 updated_at = ? \
             WHERE id = ? RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(req.first_name)
            .bind(req.last_name)
            .bind(req.address)
            .bind(req.telephone)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
