use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use spaces_api::database::MemoryStore;
use spaces_api::routes;
use spaces_api::state::AppState;

/// Router over a fresh in-memory store. Every test builds its own app, so
/// tests never observe each other's data and need no running database.
pub fn test_app() -> Router {
    routes::app(AppState::new(MemoryStore::new()))
}

/// Fire one request at the router and decode the JSON body.
pub async fn request(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

/// Register a user and log in, returning the bearer token and the user id.
pub async fn register_and_login(app: &Router, username: &str) -> Result<(String, String)> {
    let email = format!("{}@example.test", username);
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": username, "email": email, "password": "hunter22" })),
    )
    .await?;
    anyhow::ensure!(
        status == StatusCode::CREATED,
        "register failed: {} {}",
        status,
        body
    );

    let (status, body) = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "identifier": username, "password": "hunter22" })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);

    let token = body["data"]["token"]
        .as_str()
        .context("token missing from login response")?
        .to_string();
    let user_id = body["data"]["user"]["id"]
        .as_str()
        .context("user id missing from login response")?
        .to_string();
    Ok((token, user_id))
}

/// Create a taxonomy entry through the API, returning its id.
pub async fn create_entry(app: &Router, token: &str, path: &str, name: &str) -> Result<String> {
    let (status, body) = request(app, "POST", path, Some(token), Some(json!({ "name": name }))).await?;
    anyhow::ensure!(
        status == StatusCode::CREATED,
        "create {} '{}' failed: {} {}",
        path,
        name,
        status,
        body
    );
    Ok(body["data"]["id"]
        .as_str()
        .context("entry id missing")?
        .to_string())
}
