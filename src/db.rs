use std::{str::FromStr, time::Instant};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::error::DbError;

/// Embedded schema, applied by [`sync`].
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// connect
///
/// Opens a pool on a file-backed SQLite database, creating the file if needed.
/// An in-memory URL gets exactly one connection that is never recycled; otherwise each
/// new connection would see a different, empty database.
pub async fn connect(db_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if is_memory(db_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections)
    };

    pool_options.connect_with(options).await
}

fn is_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

/// Authentication half of the handshake: the database must answer a trivial query.
pub async fn authenticate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}

/// Sync half of the handshake: bring the schema up to date. Safe to run repeatedly.
pub async fn sync(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// ConnectionReport
///
/// Outcome of a successful [`check_connection`].
#[derive(Debug, Clone)]
pub struct ConnectionReport {
    pub db_url: String,
    pub migrations: usize,
    pub elapsed_ms: u128,
}

/// check_connection
///
/// Connect, authenticate and sync against `db_url`, then close the pool. The pool is
/// closed on every path once it has been opened, including when a stage fails.
pub async fn check_connection(db_url: &str) -> Result<ConnectionReport, DbError> {
    let started = Instant::now();

    let pool = connect(db_url, 1).await.map_err(|e| {
        tracing::error!(error = %e, db_url, "unable to open database");
        DbError::Connect(e)
    })?;

    let outcome = handshake(&pool).await;
    pool.close().await;
    tracing::debug!(db_url, "connection closed");

    match outcome {
        Ok(()) => {
            let report = ConnectionReport {
                db_url: db_url.to_string(),
                migrations: MIGRATOR.iter().count(),
                elapsed_ms: started.elapsed().as_millis(),
            };
            tracing::info!(
                db_url,
                elapsed_ms = report.elapsed_ms as u64,
                "connection has been established successfully"
            );
            Ok(report)
        }
        Err(e) => {
            tracing::error!(error = %e, db_url, "unable to connect to the database");
            Err(e)
        }
    }
}

async fn handshake(pool: &SqlitePool) -> Result<(), DbError> {
    authenticate(pool).await.map_err(DbError::Authenticate)?;
    sync(pool).await?;
    Ok(())
}
