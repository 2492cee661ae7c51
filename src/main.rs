use portal_api::{
    AppState,
    config::AppConfig,
    create_router, db,
    repository::{RepositoryState, SqliteRepository},
    telemetry,
};
use std::sync::Arc;
use tokio::net::TcpListener;

/// main
///
/// Entry point: configuration, logging, database, then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging
    telemetry::init(&config.env);
    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database: open the file, then the same authenticate-and-sync handshake as db-check.
    let pool = db::connect(&config.db_url, 5)
        .await
        .expect("FATAL: Failed to open the database. Check DATABASE_URL.");
    db::authenticate(&pool)
        .await
        .expect("FATAL: Database did not answer the authentication query.");
    db::sync(&pool)
        .await
        .expect("FATAL: Failed to apply database migrations.");
    tracing::info!(db_url = %config.db_url, "database ready");

    let repo = Arc::new(SqliteRepository::new(pool.clone())) as RepositoryState;

    // 4. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { repo, config });

    // 5. Server Startup
    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: cannot bind {bind_addr}: {e}"));

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("server error: {}", e);
    }

    pool.close().await;
    tracing::info!("database pool closed, bye");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
