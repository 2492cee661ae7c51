use portal_api::{db, error::DbError};
use std::path::PathBuf;
use uuid::Uuid;

/// A database file path under the system temp dir, unique per test.
fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("portal-api-test-{}.db", Uuid::new_v4()))
}

#[tokio::test]
async fn test_check_connection_creates_and_syncs_file() {
    let path = temp_db_path();
    let url = format!("sqlite://{}", path.display());

    let report = db::check_connection(&url).await.expect("check should pass");
    assert_eq!(report.db_url, url);
    assert_eq!(report.migrations, db::MIGRATOR.iter().count());
    assert!(path.exists(), "database file should have been created");

    // The schema is in place and a second handshake is a no-op.
    db::check_connection(&url).await.expect("second check should pass");
    let pool = db::connect(&url, 1).await.unwrap();
    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(tables, 1);
    pool.close().await;

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_check_connection_in_memory() {
    assert!(db::check_connection("sqlite::memory:").await.is_ok());
}

#[tokio::test]
async fn test_check_connection_reports_unopenable_path() {
    let missing_dir = std::env::temp_dir()
        .join(format!("portal-api-missing-{}", Uuid::new_v4()))
        .join("portal.db");
    let url = format!("sqlite://{}", missing_dir.display());

    let err = db::check_connection(&url).await.unwrap_err();
    assert!(matches!(err, DbError::Connect(_)), "got {err:?}");
}

#[tokio::test]
async fn test_check_connection_rejects_malformed_url() {
    let err = db::check_connection("postgres://localhost/portal")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Connect(_)));
}

#[tokio::test]
async fn test_authenticate_and_sync_are_repeatable() {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::authenticate(&pool).await.unwrap();
    db::sync(&pool).await.unwrap();
    db::sync(&pool).await.unwrap();
    db::authenticate(&pool).await.unwrap();
    pool.close().await;
}
