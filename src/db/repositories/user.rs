use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{forgot_password_tokens, prelude::*, refresh_tokens, users};
use crate::models::{NewUser, PageRequest, Role, User, UserChanges};

fn to_user(model: users::Model) -> Result<User> {
    let id = model.id;
    User::try_from(model).with_context(|| format!("User {id} has a corrupt role"))
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, new_user: &NewUser, security: &SecurityConfig) -> Result<User> {
        let password = new_user.password.clone();
        let config = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now();

        let active = users::ActiveModel {
            username: Set(new_user.username.clone()),
            password_hash: Set(password_hash),
            email: Set(new_user.email.clone()),
            role: Set(new_user.role.to_string()),
            access_token: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        to_user(model)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        user.map(to_user).transpose()
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        user.map(to_user).transpose()
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        user.map(to_user).transpose()
    }

    /// Get user by ID together with the access token currently on record
    pub async fn get_with_access_token(&self, id: i32) -> Result<Option<(User, Option<String>)>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        user.map(|u| {
            let token = u.access_token.clone();
            to_user(u).map(|user| (user, token))
        })
        .transpose()
    }

    /// True if another account (other than `except_id`) already uses the username.
    pub async fn username_taken(&self, username: &str, except_id: Option<i32>) -> Result<bool> {
        let mut query = Users::find().filter(users::Column::Username.eq(username));
        if let Some(id) = except_id {
            query = query.filter(users::Column::Id.ne(id));
        }
        Ok(query.count(&self.conn).await? > 0)
    }

    /// True if another account (other than `except_id`) already uses the email.
    pub async fn email_taken(&self, email: &str, except_id: Option<i32>) -> Result<bool> {
        let mut query = Users::find().filter(users::Column::Email.eq(email));
        if let Some(id) = except_id {
            query = query.filter(users::Column::Id.ne(id));
        }
        Ok(query.count(&self.conn).await? > 0)
    }

    /// Paged by id. Accounts holding `hidden_role` are left out.
    pub async fn list(
        &self,
        page: PageRequest,
        hidden_role: Option<Role>,
    ) -> Result<(Vec<User>, u64)> {
        let mut query = Users::find();
        if let Some(role) = hidden_role {
            query = query.filter(users::Column::Role.ne(role.to_string()));
        }

        let paginator = query
            .order_by_asc(users::Column::Id)
            .paginate(&self.conn, page.page_size);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.page.saturating_sub(1)).await?;

        let users = rows.into_iter().map(to_user).collect::<Result<Vec<_>>>()?;
        Ok((users, total))
    }

    /// Verify a password against the account matching `login` by username
    /// or email. Returns the user on success.
    /// Hashing runs on `spawn_blocking`.
    pub async fn verify_credentials(&self, login: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(login))
                    .add(users::Column::Email.eq(login.to_lowercase())),
            )
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        if verify_hash(user.password_hash.clone(), password).await? {
            to_user(user).map(Some)
        } else {
            Ok(None)
        }
    }

    pub async fn verify_password(&self, id: i32, password: &str) -> Result<bool> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        match user {
            Some(user) => verify_hash(user.password_hash, password).await,
            None => Ok(false),
        }
    }

    pub async fn update(&self, id: i32, changes: &UserChanges) -> Result<Option<User>> {
        let Some(model) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        if let Some(username) = &changes.username {
            active.username = Set(username.clone());
        }
        if let Some(email) = &changes.email {
            active.email = Set(email.clone());
        }
        if let Some(role) = changes.role {
            active.role = Set(role.to_string());
        }
        active.updated_at = Set(chrono::Utc::now());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update user")?;

        to_user(updated).map(Some)
    }

    /// Hashes and stores a new password.
    pub async fn set_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let password = new_password.to_string();
        let config = security.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(chrono::Utc::now());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Records the access token the user is allowed to present; `None` revokes it.
    pub async fn set_access_token(&self, id: i32, token: Option<&str>) -> Result<()> {
        Users::update_many()
            .col_expr(
                users::Column::AccessToken,
                sea_orm::sea_query::Expr::value(token.map(str::to_string)),
            )
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to store access token")?;

        Ok(())
    }

    /// Deletes the user and its owned tokens.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        RefreshTokens::delete_many()
            .filter(refresh_tokens::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        ForgotPasswordTokens::delete_many()
            .filter(forgot_password_tokens::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        let result = Users::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}

async fn verify_hash(password_hash: String, password: &str) -> Result<bool> {
    let password = password.to_string();

    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the argon2 crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
