use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Authorization level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    SuperUser,
    Admin,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid role '{0}'. Expected one of: SuperUser, Admin, User")]
pub struct InvalidRoleError(pub String);

impl Role {
    pub const ALL: [Self; 3] = [Self::SuperUser, Self::Admin, Self::User];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperUser => "SuperUser",
            Self::Admin => "Admin",
            Self::User => "User",
        }
    }

    /// SuperUser and Admin see every record.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::SuperUser | Self::Admin)
    }

    /// Whether an account with this role may grant `target` to someone.
    /// Only a SuperUser hands out elevated roles.
    #[must_use]
    pub const fn can_assign(self, target: Self) -> bool {
        match self {
            Self::SuperUser => true,
            Self::Admin => matches!(target, Self::User),
            Self::User => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = InvalidRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| InvalidRoleError(s.to_string()))
    }
}
