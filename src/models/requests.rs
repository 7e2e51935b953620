//! Request payloads accepted by the API, validated before they reach storage.

use serde::Deserialize;
use validator::Validate;

use crate::validation::{email_validator, password_validator, phone_validator, username_validator};

/// Contact form submission. Also used to replace an existing contact.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(custom(function = "phone_validator"))]
    pub phone: Option<String>,

    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "username_validator"))]
    pub username: String,

    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    #[validate(custom(function = "password_validator"))]
    pub password: String,
}

/// Admin-side account creation; `role` defaults to `User`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(custom(function = "username_validator"))]
    pub username: String,

    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    #[validate(custom(function = "password_validator"))]
    pub password: String,

    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "username_validator"))]
    pub username: Option<String>,

    #[validate(custom(function = "email_validator"))]
    pub email: Option<String>,

    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "username", alias = "email")]
    #[validate(length(min = 1, message = "is required"))]
    pub login: String,

    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub token: String,

    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    #[validate(custom(function = "password_validator"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub current_password: String,

    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    #[validate(custom(function = "password_validator"))]
    pub new_password: String,
}
