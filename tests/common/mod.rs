use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use microblog_api::config::AppConfig;
use microblog_api::store::MemoryStore;
use microblog_api::{app, AppState};

pub const TEST_SECRET: &str = "test-secret";

/// Build the app against a fresh in-memory store with a fixed JWT secret.
pub fn test_app() -> Router {
    let mut config = AppConfig::from_env();
    config.security.jwt_secret = TEST_SECRET.to_string();
    app(AppState::new(Arc::new(MemoryStore::new()), config))
}

/// Fire one request through the router and decode the JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

pub async fn register(app: &Router, username: &str, password: &str, name: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "username": username, "password": password, "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    body
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["data"]["token"]
        .as_str()
        .expect("login response should carry a token")
        .to_string()
}

pub async fn register_and_login(app: &Router, username: &str) -> String {
    register(app, username, "rahasia", username).await;
    login(app, username, "rahasia").await
}

pub async fn create_post(app: &Router, token: &str, title: &str, content: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/posts",
        Some(token),
        Some(json!({ "title": title, "content": content })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create post failed: {}", body);
    body["data"]["postId"].as_i64().expect("postId")
}
