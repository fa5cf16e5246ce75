use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{comments, posts, users};
use crate::middleware::require_auth;
use crate::state::AppState;

/// Build the full application router around an injected state.
pub fn app(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/users", post(users::register))
        .route("/api/users/login", post(users::login));

    let protected = Router::new()
        .route(
            "/api/users/current",
            get(users::current).patch(users::update),
        )
        .route("/api/users/:username", get(users::get_by_username))
        .route("/api/users/:username/posts", get(posts::list_by_username))
        .route("/api/posts", post(posts::create).get(posts::list))
        .route(
            "/api/posts/:postId",
            get(posts::get_by_id)
                .put(posts::update)
                .delete(posts::delete),
        )
        .route(
            "/api/posts/:postId/comments",
            post(comments::create).get(comments::list),
        )
        .route(
            "/api/posts/:postId/comments/:commentId",
            get(comments::get_by_id)
                .put(comments::update)
                .delete(comments::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .merge(public)
        .merge(protected)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "data": { "status": "ok", "timestamp": now }
            })),
        ),
        Err(e) => {
            tracing::error!("store health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "errors": "store unavailable",
                })),
            )
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "errors": "endpoint not found" })),
    )
}
