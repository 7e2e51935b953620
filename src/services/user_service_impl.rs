//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::config::SecurityConfig;
use crate::db::repositories::is_unique_violation;
use crate::db::{Store, TokenKind};
use crate::models::{
    ChangePasswordRequest, CreateUserRequest, CurrentUser, ForgotPasswordRequest, LoginRequest,
    NewUser, PageRequest, Paged, RefreshRequest, RegisterRequest, ResetPasswordRequest, Role,
    UpdateUserRequest, User, UserChanges,
};
use crate::services::email_service::EmailService;
use crate::services::token_service::TokenService;
use crate::services::user_service::{AuthTokens, UserError, UserService};
use crate::validation::normalize_email;

pub struct SeaOrmUserService {
    store: Store,
    tokens: TokenService,
    email: Arc<EmailService>,
    security: SecurityConfig,
    /// The account seeded at startup; it cannot be deleted, renamed or demoted.
    seeded_username: String,
}

impl SeaOrmUserService {
    #[must_use]
    pub fn new(
        store: Store,
        email: Arc<EmailService>,
        security: SecurityConfig,
        seeded_username: String,
    ) -> Self {
        Self {
            store,
            tokens: TokenService::new(&security),
            email,
            security,
            seeded_username,
        }
    }

    async fn ensure_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except_id: Option<i32>,
    ) -> Result<(), UserError> {
        let repo = self.store.user_repo();

        if let Some(username) = username
            && repo.username_taken(username, except_id).await?
        {
            return Err(UserError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }

        if let Some(email) = email
            && repo.email_taken(email, except_id).await?
        {
            return Err(UserError::Conflict(format!(
                "Email '{email}' is already registered"
            )));
        }

        Ok(())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, UserError> {
        self.ensure_unique(Some(&new_user.username), Some(&new_user.email), None)
            .await?;

        let user = self
            .store
            .user_repo()
            .insert(&new_user, &self.security)
            .await
            .map_err(unique_conflict)?;

        info!(id = user.id, username = %user.username, role = %user.role, "Created user");
        self.email.account_created(&user).await;
        Ok(user)
    }

    /// Issues an access token (recorded on the user) and a refresh token that
    /// replaces any previous one.
    async fn issue_session(&self, user: User) -> Result<AuthTokens, UserError> {
        let access = self.tokens.issue_access_token(&user)?;
        self.store
            .user_repo()
            .set_access_token(user.id, Some(&access.token))
            .await?;

        let refresh_token = TokenService::generate_opaque_token();
        let refresh_expires_at = self.tokens.refresh_expiry(Utc::now());
        self.store
            .token_repo()
            .replace(
                TokenKind::Refresh,
                user.id,
                &TokenService::hash_token(&refresh_token),
                refresh_expires_at,
            )
            .await?;

        Ok(AuthTokens {
            access_token: access.token,
            refresh_token,
            token_type: "Bearer",
            expires_at: access.expires_at,
            refresh_expires_at,
            user,
        })
    }

    async fn revoke_sessions(&self, user_id: i32) -> Result<(), UserError> {
        self.store.user_repo().set_access_token(user_id, None).await?;
        self.store
            .token_repo()
            .delete_for_user(TokenKind::Refresh, user_id)
            .await?;
        Ok(())
    }

    async fn load(&self, id: i32) -> Result<User, UserError> {
        self.store
            .user_repo()
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Self or admin; SuperUser accounts are only touched by SuperUsers.
    fn authorize_target(caller: &CurrentUser, target: &User) -> Result<(), UserError> {
        if !caller.is_admin() && caller.id != target.id {
            return Err(UserError::forbidden(
                "You can only access your own account",
            ));
        }
        if target.role == Role::SuperUser && caller.role != Role::SuperUser {
            return Err(UserError::forbidden(
                "Only a SuperUser can modify a SuperUser account",
            ));
        }
        Ok(())
    }
}

/// A concurrent writer can claim a username or email between the uniqueness
/// check and the write; the unique index reports it.
fn unique_conflict(err: anyhow::Error) -> UserError {
    if is_unique_violation(&err) {
        UserError::Conflict("Username or email is already in use".to_string())
    } else {
        UserError::from(err)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, request: RegisterRequest) -> Result<User, UserError> {
        request.validate()?;

        self.insert(NewUser {
            username: request.username,
            email: normalize_email(&request.email),
            password: request.password,
            role: Role::User,
        })
        .await
    }

    async fn create(
        &self,
        caller: &CurrentUser,
        request: CreateUserRequest,
    ) -> Result<User, UserError> {
        if !caller.is_admin() {
            return Err(UserError::forbidden("Only administrators can create users"));
        }

        request.validate()?;

        let role = request
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()?
            .unwrap_or(Role::User);

        if !caller.role.can_assign(role) {
            return Err(UserError::forbidden(format!(
                "A {} cannot create {role} accounts",
                caller.role
            )));
        }

        self.insert(NewUser {
            username: request.username,
            email: normalize_email(&request.email),
            password: request.password,
            role,
        })
        .await
    }

    async fn login(&self, request: LoginRequest) -> Result<AuthTokens, UserError> {
        request.validate()?;

        let Some(user) = self
            .store
            .user_repo()
            .verify_credentials(request.login.trim(), &request.password)
            .await?
        else {
            warn!("Failed login attempt");
            return Err(UserError::InvalidCredentials);
        };

        info!(id = user.id, username = %user.username, "User logged in");
        self.issue_session(user).await
    }

    async fn refresh(&self, request: RefreshRequest) -> Result<AuthTokens, UserError> {
        request.validate()?;

        let tokens = self.store.token_repo();
        let stored = tokens
            .find(
                TokenKind::Refresh,
                &TokenService::hash_token(request.refresh_token.trim()),
            )
            .await?
            .ok_or(UserError::InvalidToken)?;

        if stored.is_expired(Utc::now()) {
            tokens.delete(TokenKind::Refresh, stored.id).await?;
            return Err(UserError::TokenExpired);
        }

        let user = self
            .store
            .user_repo()
            .get_by_id(stored.user_id)
            .await?
            .ok_or(UserError::InvalidToken)?;

        self.issue_session(user).await
    }

    async fn logout(&self, caller: &CurrentUser) -> Result<(), UserError> {
        self.revoke_sessions(caller.id).await?;
        info!(id = caller.id, "User logged out");
        Ok(())
    }

    async fn authenticate(&self, bearer: &str) -> Result<CurrentUser, UserError> {
        let claims = self.tokens.validate_access_token(bearer)?;
        let user_id = claims.user_id()?;

        let Some((user, stored)) = self
            .store
            .user_repo()
            .get_with_access_token(user_id)
            .await?
        else {
            return Err(UserError::Unauthorized);
        };

        if stored.as_deref() != Some(bearer) {
            return Err(UserError::Unauthorized);
        }

        Ok(CurrentUser::from(&user))
    }

    async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<(), UserError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let Some(user) = self.store.user_repo().get_by_email(&email).await? else {
            info!("Password reset requested for an unknown email");
            return Ok(());
        };

        let token = TokenService::generate_opaque_token();
        let expires_at = self.tokens.forgot_password_expiry(Utc::now());
        self.store
            .token_repo()
            .replace(
                TokenKind::ForgotPassword,
                user.id,
                &TokenService::hash_token(&token),
                expires_at,
            )
            .await?;

        info!(id = user.id, "Issued password reset token");
        self.email.forgot_password(&user, &token, expires_at).await;
        Ok(())
    }

    async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), UserError> {
        request.validate()?;

        let tokens = self.store.token_repo();
        let stored = tokens
            .find(
                TokenKind::ForgotPassword,
                &TokenService::hash_token(request.token.trim()),
            )
            .await?
            .ok_or(UserError::InvalidToken)?;

        if stored.is_expired(Utc::now()) {
            tokens.delete(TokenKind::ForgotPassword, stored.id).await?;
            return Err(UserError::TokenExpired);
        }

        let user = self
            .store
            .user_repo()
            .get_by_id(stored.user_id)
            .await?
            .ok_or(UserError::InvalidToken)?;

        self.store
            .user_repo()
            .set_password(user.id, &request.new_password, &self.security)
            .await?;
        tokens.delete(TokenKind::ForgotPassword, stored.id).await?;
        self.revoke_sessions(user.id).await?;

        info!(id = user.id, "Password reset");
        self.email.account_updated(&user).await;
        Ok(())
    }

    async fn change_password(
        &self,
        caller: &CurrentUser,
        request: ChangePasswordRequest,
    ) -> Result<(), UserError> {
        request.validate()?;

        if request.current_password == request.new_password {
            return Err(UserError::Validation(
                "new_password: must be different from the current password".to_string(),
            ));
        }

        let repo = self.store.user_repo();
        if !repo
            .verify_password(caller.id, &request.current_password)
            .await?
        {
            return Err(UserError::Validation(
                "current_password: is incorrect".to_string(),
            ));
        }

        repo.set_password(caller.id, &request.new_password, &self.security)
            .await?;

        info!(id = caller.id, "Password changed");
        let user = self.load(caller.id).await?;
        self.email.account_updated(&user).await;
        Ok(())
    }

    async fn list(
        &self,
        caller: &CurrentUser,
        page: PageRequest,
    ) -> Result<Paged<User>, UserError> {
        if caller.is_admin() {
            let hidden = (caller.role != Role::SuperUser).then_some(Role::SuperUser);
            let (users, total) = self.store.user_repo().list(page, hidden).await?;
            return Ok(Paged::new(users, page, total));
        }

        let me = self.load(caller.id).await?;
        let items = if page.page == 1 { vec![me] } else { Vec::new() };
        Ok(Paged::new(items, page, 1))
    }

    async fn get(&self, caller: &CurrentUser, id: i32) -> Result<User, UserError> {
        if !caller.is_admin() && caller.id != id {
            return Err(UserError::forbidden(
                "You can only access your own account",
            ));
        }

        let user = self.load(id).await?;
        Self::authorize_target(caller, &user)?;
        Ok(user)
    }

    async fn me(&self, caller: &CurrentUser) -> Result<User, UserError> {
        self.load(caller.id).await
    }

    async fn update(
        &self,
        caller: &CurrentUser,
        id: i32,
        request: UpdateUserRequest,
    ) -> Result<User, UserError> {
        request.validate()?;

        let target = self.load(id).await?;
        Self::authorize_target(caller, &target)?;

        let role = request
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()?
            .filter(|role| *role != target.role);

        if let Some(role) = role {
            if !caller.role.can_assign(role) || !caller.role.can_assign(target.role) {
                return Err(UserError::forbidden(format!(
                    "A {} cannot change this account to {role}",
                    caller.role
                )));
            }
            if target.username == self.seeded_username {
                return Err(UserError::forbidden(
                    "The seeded SuperUser's role cannot be changed",
                ));
            }
        }

        let username = request
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| *u != target.username);
        if username.is_some() && target.username == self.seeded_username {
            return Err(UserError::forbidden(
                "The seeded SuperUser cannot be renamed",
            ));
        }

        let email = request
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| *e != target.email);

        self.ensure_unique(username.as_deref(), email.as_deref(), Some(id))
            .await?;

        let changes = UserChanges {
            username,
            email,
            role,
        };
        let user = self
            .store
            .user_repo()
            .update(id, &changes)
            .await
            .map_err(unique_conflict)?
            .ok_or(UserError::NotFound(id))?;

        if role.is_some() {
            self.revoke_sessions(id).await?;
            info!(id, role = %user.role, "Role changed, sessions revoked");
        }

        self.email.account_updated(&user).await;
        Ok(user)
    }

    async fn delete(&self, caller: &CurrentUser, id: i32) -> Result<User, UserError> {
        let target = self.load(id).await?;
        Self::authorize_target(caller, &target)?;

        if target.username == self.seeded_username {
            return Err(UserError::forbidden(
                "The seeded SuperUser cannot be deleted",
            ));
        }

        if !self.store.user_repo().delete(id).await? {
            return Err(UserError::NotFound(id));
        }

        info!(id, by = %caller.username, "Deleted user");
        self.email.account_deleted(&target).await;
        Ok(target)
    }
}
