use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

use super::extract::ApiJson;
use super::{ApiError, ApiResponse, AppState};
use crate::models::{
    CurrentUser, ForgotPasswordRequest, LoginRequest, RefreshRequest, ResetPasswordRequest,
};
use crate::services::{AuthTokens, UserError};

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <jwt>` to a [`CurrentUser`] request
/// extension. The token must be the one currently on record for the user.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_bearer(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let user = state
        .user_service()
        .authenticate(token)
        .await
        .map_err(|e| match e {
            UserError::TokenExpired => ApiError::unauthorized("Token expired"),
            UserError::InvalidToken | UserError::Unauthorized | UserError::NotFound(_) => {
                ApiError::unauthorized("Invalid or revoked token")
            }
            other => ApiError::from(other),
        })?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthTokens>>, ApiError> {
    let tokens = state.user_service().login(payload).await?;
    Ok(Json(ApiResponse::success(tokens, "Login successful")))
}

/// POST /auth/refresh
/// Consumes the refresh token and returns a new token pair
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<ApiResponse<AuthTokens>>, ApiError> {
    let tokens = state.user_service().refresh(payload).await?;
    Ok(Json(ApiResponse::success(tokens, "Token refreshed")))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.user_service().logout(&caller).await?;
    Ok(Json(ApiResponse::ok("Logged out")))
}

/// POST /auth/forgot-password
/// Answers the same way whether or not the email is registered
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.user_service().forgot_password(payload).await?;
    Ok(Json(ApiResponse::ok(
        "If the email is registered, a password reset link has been sent",
    )))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.user_service().reset_password(payload).await?;
    Ok(Json(ApiResponse::ok("Password has been reset")))
}
