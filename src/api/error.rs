use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{ContactError, UserError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::NotFound(id) => Self::not_found("Contact", id),
            ContactError::Forbidden => Self::Forbidden(err.to_string()),
            ContactError::Conflict(msg) => Self::Conflict(msg),
            ContactError::Validation(msg) => Self::validation(msg),
            ContactError::Database(msg) => Self::DatabaseError(msg),
            ContactError::Internal(msg) => Self::internal(msg),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidCredentials
            | UserError::InvalidToken
            | UserError::TokenExpired
            | UserError::Unauthorized => Self::Unauthorized(err.to_string()),
            UserError::NotFound(id) => Self::not_found("User", id),
            UserError::Forbidden(msg) => Self::Forbidden(msg),
            UserError::Conflict(msg) => Self::Conflict(msg),
            UserError::InvalidRole(e) => Self::validation(e.to_string()),
            UserError::Validation(msg) => Self::validation(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvalidRoleError;

    #[test]
    fn test_service_errors_map_to_status() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (ContactError::NotFound(4).into(), StatusCode::NOT_FOUND),
            (ContactError::Forbidden.into(), StatusCode::FORBIDDEN),
            (
                ContactError::Conflict("taken".to_string()).into(),
                StatusCode::CONFLICT,
            ),
            (UserError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (UserError::TokenExpired.into(), StatusCode::UNAUTHORIZED),
            (
                UserError::InvalidRole(InvalidRoleError("root".to_string())).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                UserError::Database("locked".to_string()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
