use axum::{extract::State, Extension};

use crate::api::DataBody;
use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::middleware::AuthUser;
use crate::services::user_service::{
    LoginUserRequest, RegisterUserRequest, UpdateUserRequest, UserResponse,
};
use crate::services::UserService;
use crate::state::AppState;

fn service(state: &AppState) -> UserService {
    UserService::new(state.store.clone(), state.config.clone())
}

/// POST /api/users
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<Json<DataBody<UserResponse>>, ApiError> {
    let result = service(&state).register(request).await?;
    Ok(Json(DataBody { data: result }))
}

/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginUserRequest>,
) -> Result<Json<DataBody<UserResponse>>, ApiError> {
    let result = service(&state).login(request).await?;
    Ok(Json(DataBody { data: result }))
}

/// GET /api/users/current
pub async fn current(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<DataBody<UserResponse>>, ApiError> {
    let result = service(&state).get(&user);
    Ok(Json(DataBody { data: result }))
}

/// PATCH /api/users/current
pub async fn update(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<DataBody<UserResponse>>, ApiError> {
    let result = service(&state).update(&user, request).await?;
    Ok(Json(DataBody { data: result }))
}

/// GET /api/users/:username
pub async fn get_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<DataBody<UserResponse>>, ApiError> {
    let result = service(&state).get_by_username(&username).await?;
    Ok(Json(DataBody { data: result }))
}
