use chrono::{DateTime, Utc};
use serde::Serialize;

use super::role::Role;
use crate::entities::users;

/// User data without the password hash or stored tokens.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<users::Model> for User {
    type Error = super::role::InvalidRoleError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role.parse()?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// The authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Admins act on anything; everyone else only on their own email.
    #[must_use]
    pub fn owns_email(&self, email: &str) -> bool {
        self.is_admin() || self.email.eq_ignore_ascii_case(email)
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}
