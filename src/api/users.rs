use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validation::{PageQuery, validate_id, validate_page};
use super::{ApiError, ApiResponse, AppState};
use crate::models::{
    ChangePasswordRequest, CreateUserRequest, CurrentUser, Paged, RegisterRequest,
    UpdateUserRequest, User,
};

/// POST /users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let user = state.user_service().register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user, "Account created")),
    ))
}

/// POST /users
/// Admin-only account creation with an explicit role
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let user = state.user_service().create(&caller, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user, "User created")),
    ))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<ApiResponse<Paged<User>>>, ApiError> {
    let page = validate_page(&query)?;
    let users = state.user_service().list(&caller, page).await?;
    Ok(Json(ApiResponse::success(users, "Users retrieved")))
}

/// GET /users/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.user_service().me(&caller).await?;
    Ok(Json(ApiResponse::success(user, "User retrieved")))
}

/// PUT /users/me/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .user_service()
        .change_password(&caller, payload)
        .await?;

    tracing::info!("Password changed for user: {}", caller.username);
    Ok(Json(ApiResponse::ok("Password updated successfully")))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id("user", id)?;
    let user = state.user_service().get(&caller, id).await?;
    Ok(Json(ApiResponse::success(user, "User retrieved")))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id("user", id)?;
    let user = state.user_service().update(&caller, id, payload).await?;
    Ok(Json(ApiResponse::success(user, "User updated")))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id("user", id)?;
    let user = state.user_service().delete(&caller, id).await?;
    Ok(Json(ApiResponse::success(user, "User deleted")))
}
