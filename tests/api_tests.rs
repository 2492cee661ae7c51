mod common;

use portal_api::{
    create_router,
    models::{AuthResponse, ClaimsResponse, DbStatus, ErrorBody, User},
};
use reqwest::StatusCode;
use serde_json::json;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app() -> TestApp {
    let state = common::memory_state().await;
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

fn documented_payload(tag: &str) -> serde_json::Value {
    json!({
        "email": format!("{tag}@example.com"),
        "firstName": "Ada",
        "lastName": "Lovelace",
        "username": tag,
        "address": "12 St James's Square, London",
        "telephone": "+44 20 7946 0958",
        "password": "analytical-engine"
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/health/db", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status: DbStatus = response.json().await.unwrap();
    assert_eq!(status.status, "ok");
}

#[tokio::test]
async fn test_register_smoke() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register", app.address))
        .json(&documented_payload("ada"))
        .send()
        .await
        .expect("post fail");

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key("x-request-id"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["username"], "ada");
    assert_eq!(body["user"]["firstName"], "Ada");
    assert_eq!(body["tokenType"], "Bearer");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_malformed_json_returns_error_body() {
    let app = spawn_app().await;
    let response = reqwest::Client::new()
        .post(format!("{}/register", app.address))
        .header("content-type", "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: ErrorBody = response.json().await.unwrap();
    assert!(!body.error.is_empty());
    assert!(body.details.is_none());
}

#[tokio::test]
async fn test_register_missing_field_returns_error_body() {
    let app = spawn_app().await;
    let response = reqwest::Client::new()
        .post(format!("{}/register", app.address))
        .json(&json!({ "email": "a@b.co" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: ErrorBody = response.json().await.unwrap();
    assert!(body.error.contains("firstName"), "got {:?}", body.error);
}

#[tokio::test]
async fn test_login_without_content_type_returns_error_body() {
    let app = spawn_app().await;
    let response = reqwest::Client::new()
        .post(format!("{}/login", app.address))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn test_register_validation_error_body() {
    let app = spawn_app().await;
    let mut payload = documented_payload("ada");
    payload["email"] = json!("nope");

    let response = reqwest::Client::new()
        .post(format!("{}/register", app.address))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "validation failed");
    assert!(body.details.unwrap().contains_key("email"));
}

#[tokio::test]
async fn test_authenticated_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let registered: AuthResponse = client
        .post(format!("{}/register", app.address))
        .json(&documented_payload("ada"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Without a token the protected routes refuse.
    let response = client
        .get(format!("{}/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "authentication required");

    // Login issues a token that works the same as the registration one.
    let login: AuthResponse = client
        .post(format!("{}/login", app.address))
        .json(&json!({ "login": "ada@example.com", "password": "analytical-engine" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(login.user.id, registered.user.id);

    let me: User = client
        .get(format!("{}/me", app.address))
        .bearer_auth(&login.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me.id, registered.user.id);

    let claims: ClaimsResponse = client
        .get(format!("{}/me/claims", app.address))
        .bearer_auth(&registered.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(claims.sub, registered.user.id);
    assert_eq!(claims.username, "ada");

    let updated: User = client
        .put(format!("{}/me", app.address))
        .bearer_auth(&registered.token)
        .json(&json!({ "telephone": "+44 1483 000000" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.telephone, "+44 1483 000000");
    assert_eq!(updated.address, registered.user.address);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = spawn_app().await;
    let response = reqwest::Client::new()
        .get(format!("{}/me/claims", app.address))
        .bearer_auth("definitely.not.valid")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_header() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let registered: AuthResponse = client
        .post(format!("{}/register", app.address))
        .json(&documented_payload("grace"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .get(format!("{}/me", app.address))
        .header("x-user-id", registered.user.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The bypass resolves a user but attaches no token payload.
    let response = client
        .get(format!("{}/me/claims", app.address))
        .header("x-user-id", registered.user.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // With another user's token alongside, both routes still report the bypassed user.
    let other: AuthResponse = client
        .post(format!("{}/register", app.address))
        .json(&documented_payload("ada"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let me: User = client
        .get(format!("{}/me", app.address))
        .header("x-user-id", registered.user.id.to_string())
        .bearer_auth(&other.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me.id, registered.user.id);

    let response = client
        .get(format!("{}/me/claims", app.address))
        .header("x-user-id", registered.user.id.to_string())
        .bearer_auth(&other.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let doc: serde_json::Value = reqwest::get(format!("{}/api-docs/openapi.json", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(doc["paths"].get("/register").is_some());
    assert!(doc["paths"].get("/me/claims").is_some());
}
