use axum::{extract::State, Extension};

use crate::api::{DataBody, PageBody, PageQuery};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::middleware::AuthUser;
use crate::services::comment_service::{
    CommentResponse, CreateCommentRequest, UpdateCommentRequest,
};
use crate::services::CommentService;
use crate::state::AppState;

fn service(state: &AppState) -> CommentService {
    CommentService::new(state.store.clone())
}

/// POST /api/posts/:postId/comments
pub async fn create(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(post_id): Path<i64>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<DataBody<CommentResponse>>, ApiError> {
    let result = service(&state).create(&user, post_id, request).await?;
    Ok(Json(DataBody { data: result }))
}

/// PUT /api/posts/:postId/comments/:commentId
pub async fn update(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<DataBody<CommentResponse>>, ApiError> {
    let result = service(&state)
        .update(&user, post_id, comment_id, request)
        .await?;
    Ok(Json(DataBody { data: result }))
}

/// DELETE /api/posts/:postId/comments/:commentId
pub async fn delete(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<DataBody<bool>>, ApiError> {
    let result = service(&state).delete(&user, post_id, comment_id).await?;
    Ok(Json(DataBody { data: result }))
}

/// GET /api/posts/:postId/comments/:commentId
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<DataBody<CommentResponse>>, ApiError> {
    let result = service(&state).find_by_id(post_id, comment_id).await?;
    Ok(Json(DataBody { data: result }))
}

/// GET /api/posts/:postId/comments?page=&size=
pub async fn list(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageBody<CommentResponse>>, ApiError> {
    let paging = query.resolve()?;
    let result = service(&state).find_by_post_id(post_id, paging).await?;
    Ok(Json(PageBody {
        data: result,
        paging,
    }))
}
