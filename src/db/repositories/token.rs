use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};

use crate::entities::{forgot_password_tokens, prelude::*, refresh_tokens};

/// The two token kinds owned by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Refresh,
    ForgotPassword,
}

impl TokenKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::ForgotPassword => "forgot-password",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredToken {
    pub id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl From<refresh_tokens::Model> for StoredToken {
    fn from(m: refresh_tokens::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            created_at: m.created_at,
            expires_at: m.expires_at,
        }
    }
}

impl From<forgot_password_tokens::Model> for StoredToken {
    fn from(m: forgot_password_tokens::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            created_at: m.created_at,
            expires_at: m.expires_at,
        }
    }
}

/// Repository for refresh and forgot-password tokens. Only digests are stored.
pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Replaces whatever token of this kind the user had.
    pub async fn replace(
        &self,
        kind: TokenKind,
        user_id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let now = Utc::now();
        let txn = self.conn.begin().await?;

        match kind {
            TokenKind::Refresh => {
                RefreshTokens::delete_many()
                    .filter(refresh_tokens::Column::UserId.eq(user_id))
                    .exec(&txn)
                    .await?;
                RefreshTokens::insert(refresh_tokens::ActiveModel {
                    user_id: Set(user_id),
                    token_hash: Set(token_hash.to_string()),
                    created_at: Set(now),
                    expires_at: Set(expires_at),
                    ..Default::default()
                })
                .exec(&txn)
                .await?;
            }
            TokenKind::ForgotPassword => {
                ForgotPasswordTokens::delete_many()
                    .filter(forgot_password_tokens::Column::UserId.eq(user_id))
                    .exec(&txn)
                    .await?;
                ForgotPasswordTokens::insert(forgot_password_tokens::ActiveModel {
                    user_id: Set(user_id),
                    token_hash: Set(token_hash.to_string()),
                    created_at: Set(now),
                    expires_at: Set(expires_at),
                    ..Default::default()
                })
                .exec(&txn)
                .await?;
            }
        }

        txn.commit()
            .await
            .with_context(|| format!("Failed to store {} token", kind.label()))
    }

    pub async fn find(&self, kind: TokenKind, token_hash: &str) -> Result<Option<StoredToken>> {
        let token = match kind {
            TokenKind::Refresh => RefreshTokens::find()
                .filter(refresh_tokens::Column::TokenHash.eq(token_hash))
                .one(&self.conn)
                .await?
                .map(StoredToken::from),
            TokenKind::ForgotPassword => ForgotPasswordTokens::find()
                .filter(forgot_password_tokens::Column::TokenHash.eq(token_hash))
                .one(&self.conn)
                .await?
                .map(StoredToken::from),
        };

        Ok(token)
    }

    pub async fn delete(&self, kind: TokenKind, id: i32) -> Result<()> {
        match kind {
            TokenKind::Refresh => {
                RefreshTokens::delete_by_id(id).exec(&self.conn).await?;
            }
            TokenKind::ForgotPassword => {
                ForgotPasswordTokens::delete_by_id(id).exec(&self.conn).await?;
            }
        }
        Ok(())
    }

    pub async fn delete_for_user(&self, kind: TokenKind, user_id: i32) -> Result<()> {
        match kind {
            TokenKind::Refresh => {
                RefreshTokens::delete_many()
                    .filter(refresh_tokens::Column::UserId.eq(user_id))
                    .exec(&self.conn)
                    .await?;
            }
            TokenKind::ForgotPassword => {
                ForgotPasswordTokens::delete_many()
                    .filter(forgot_password_tokens::Column::UserId.eq(user_id))
                    .exec(&self.conn)
                    .await?;
            }
        }
        Ok(())
    }

    /// Deletes every token of either kind that expired at or before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let refresh = RefreshTokens::delete_many()
            .filter(refresh_tokens::Column::ExpiresAt.lte(now))
            .exec(&self.conn)
            .await?;
        let forgot = ForgotPasswordTokens::delete_many()
            .filter(forgot_password_tokens::Column::ExpiresAt.lte(now))
            .exec(&self.conn)
            .await?;

        Ok(refresh.rows_affected + forgot.rows_affected)
    }
}
