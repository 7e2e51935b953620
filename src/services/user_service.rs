//! Domain service for accounts and sessions.
//!
//! Covers registration, admin-side account management, JWT login with
//! rotating refresh tokens, and the forgot/reset password flow.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{
    ChangePasswordRequest, CreateUserRequest, CurrentUser, ForgotPasswordRequest,
    InvalidRoleError, LoginRequest, PageRequest, Paged, RefreshRequest, RegisterRequest,
    ResetPasswordRequest, UpdateUserRequest, User,
};
use crate::services::token_service::TokenError;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or unknown token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Authentication required")]
    Unauthorized,

    #[error("User not found: {0}")]
    NotFound(i32),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    InvalidRole(#[from] InvalidRoleError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UserError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for UserError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(crate::validation::describe(&err))
    }
}

impl From<TokenError> for UserError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Invalid(_) => Self::InvalidToken,
            TokenError::Generation(msg) => Self::Internal(msg),
        }
    }
}

/// Returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub user: User,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Public sign-up. The account always gets the `User` role.
    ///
    /// # Errors
    ///
    /// - [`UserError::Validation`] for malformed fields
    /// - [`UserError::Conflict`] if the username or email is taken
    async fn register(&self, request: RegisterRequest) -> Result<User, UserError>;

    /// Admin-side creation with an optional role.
    ///
    /// # Errors
    ///
    /// - [`UserError::InvalidRole`] for an unknown role name
    /// - [`UserError::Forbidden`] if the caller may not grant that role
    async fn create(
        &self,
        caller: &CurrentUser,
        request: CreateUserRequest,
    ) -> Result<User, UserError>;

    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] for any unknown login or wrong password.
    async fn login(&self, request: LoginRequest) -> Result<AuthTokens, UserError>;

    /// Exchanges a refresh token for a new pair. The presented token is consumed.
    async fn refresh(&self, request: RefreshRequest) -> Result<AuthTokens, UserError>;

    /// Revokes the caller's access and refresh tokens.
    async fn logout(&self, caller: &CurrentUser) -> Result<(), UserError>;

    /// Resolves a bearer token to the account it was issued to.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Unauthorized`] if the token is not the one on record.
    async fn authenticate(&self, bearer: &str) -> Result<CurrentUser, UserError>;

    /// Succeeds whether or not the email belongs to an account.
    async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<(), UserError>;

    async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), UserError>;

    async fn change_password(
        &self,
        caller: &CurrentUser,
        request: ChangePasswordRequest,
    ) -> Result<(), UserError>;

    async fn list(&self, caller: &CurrentUser, page: PageRequest)
    -> Result<Paged<User>, UserError>;

    async fn get(&self, caller: &CurrentUser, id: i32) -> Result<User, UserError>;

    async fn me(&self, caller: &CurrentUser) -> Result<User, UserError>;

    async fn update(
        &self,
        caller: &CurrentUser,
        id: i32,
        request: UpdateUserRequest,
    ) -> Result<User, UserError>;

    /// Returns the removed account.
    async fn delete(&self, caller: &CurrentUser, id: i32) -> Result<User, UserError>;
}
