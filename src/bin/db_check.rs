//! Standalone connectivity check: open the configured SQLite file, authenticate,
//! sync the schema, close. Exits non-zero when any stage fails.

use std::process::ExitCode;

use portal_api::{config::AppConfig, db, telemetry};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let config = AppConfig::load();
    telemetry::init(&config.env);

    match db::check_connection(&config.db_url).await {
        Ok(report) => {
            tracing::info!(
                db_url = %report.db_url,
                migrations = report.migrations,
                elapsed_ms = report.elapsed_ms as u64,
                "database check passed"
            );
            ExitCode::SUCCESS
        }
        // Already logged by check_connection.
        Err(_) => ExitCode::FAILURE,
    }
}
