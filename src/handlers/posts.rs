use axum::{extract::State, Extension};

use crate::api::{DataBody, PageBody, PageQuery};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::middleware::AuthUser;
use crate::services::post_service::{CreatePostRequest, PostResponse, UpdatePostRequest};
use crate::services::PostService;
use crate::state::AppState;

fn service(state: &AppState) -> PostService {
    PostService::new(state.store.clone())
}

/// POST /api/posts
pub async fn create(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<DataBody<PostResponse>>, ApiError> {
    let result = service(&state).create(&user, request).await?;
    Ok(Json(DataBody { data: result }))
}

/// PUT /api/posts/:postId
pub async fn update(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(post_id): Path<i64>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<DataBody<PostResponse>>, ApiError> {
    let result = service(&state).update(&user, post_id, request).await?;
    Ok(Json(DataBody { data: result }))
}

/// GET /api/posts/:postId
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<DataBody<PostResponse>>, ApiError> {
    let result = service(&state).get_by_id(post_id).await?;
    Ok(Json(DataBody { data: result }))
}

/// DELETE /api/posts/:postId
pub async fn delete(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(post_id): Path<i64>,
) -> Result<Json<DataBody<bool>>, ApiError> {
    let result = service(&state).delete(&user, post_id).await?;
    Ok(Json(DataBody { data: result }))
}

/// GET /api/posts?search=&page=&size=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageBody<PostResponse>>, ApiError> {
    let paging = query.resolve()?;
    let result = service(&state)
        .get_or_search(query.search.as_deref(), paging)
        .await?;
    Ok(Json(PageBody {
        data: result,
        paging,
    }))
}

/// GET /api/users/:username/posts?page=&size=
pub async fn list_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageBody<PostResponse>>, ApiError> {
    let paging = query.resolve()?;
    let result = service(&state).find_by_username(&username, paging).await?;
    Ok(Json(PageBody {
        data: result,
        paging,
    }))
}
