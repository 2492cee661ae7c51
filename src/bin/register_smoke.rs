//! Smoke test for a running server: wait for it to come up, POST the documented
//! registration payload, log status and body.
//!
//! `SMOKE_BASE_URL` (default `http://localhost:3000`) and `SMOKE_DELAY_MS`
//! (default 2000) tune the target and the startup wait.

use std::{process::ExitCode, time::Duration};

use portal_api::{config::Env, models::RegisterUserRequest, telemetry};

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_DELAY_MS: u64 = 2000;

fn sample_payload() -> RegisterUserRequest {
    // Unique per run so repeated smoke runs do not trip the uniqueness checks.
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..8];
    RegisterUserRequest {
        email: format!("smoke.{suffix}@example.com"),
        first_name: "Smoke".to_string(),
        last_name: "Test".to_string(),
        username: format!("smoke_{suffix}"),
        address: "1 Test Street, Testville".to_string(),
        telephone: "+1 555 010 0000".to_string(),
        password: "smoke-test-password".to_string(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    telemetry::init(&Env::Local);

    let base_url = std::env::var("SMOKE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let delay_ms = std::env::var("SMOKE_DELAY_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_DELAY_MS);

    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    let payload = sample_payload();
    tracing::info!(?payload, "posting registration to {}/register", base_url);

    let response = match reqwest::Client::new()
        .post(format!("{base_url}/register"))
        .json(&payload)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("registration request failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(%status, "could not read registration response body: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match ResponseBody::from_text(text) {
        ResponseBody::Json(body) => tracing::info!(%status, %body, "registration response"),
        ResponseBody::Raw(body) => {
            tracing::warn!(%status, %body, "registration response (not JSON)")
        }
    }
    ExitCode::SUCCESS
}

/// What the server sent back: parsed JSON, or the raw text when it does not parse.
#[derive(Debug, PartialEq)]
enum ResponseBody {
    Json(serde_json::Value),
    Raw(String),
}

impl ResponseBody {
    fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Raw(text),
        }
    }
}
