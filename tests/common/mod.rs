#![allow(dead_code)]

use portal_api::{
    AppConfig, AppState, db,
    models::{RegisterUserRequest, User},
    repository::{RepositoryState, SqliteRepository},
};
use std::sync::Arc;

/// Fresh in-memory database with the schema applied.
pub async fn memory_repo() -> SqliteRepository {
    let pool = db::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory sqlite");
    db::sync(&pool).await.expect("migrations");
    SqliteRepository::new(pool)
}

pub async fn memory_state() -> AppState {
    AppState {
        repo: Arc::new(memory_repo().await) as RepositoryState,
        config: AppConfig::default(),
    }
}

pub fn registration(tag: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        email: format!("{tag}@example.com"),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        username: tag.to_string(),
        address: "12 St James's Square, London".to_string(),
        telephone: "+44 20 7946 0958".to_string(),
        password: "analytical-engine".to_string(),
    }
}

pub fn sample_user(username: &str) -> User {
    User {
        id: uuid::Uuid::new_v4(),
        email: format!("{username}@example.com"),
        username: username.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        address: "London".to_string(),
        telephone: "+44 20 7946 0958".to_string(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}
