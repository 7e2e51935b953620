use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::{GeneralConfig, SecurityConfig, SuperUserConfig};
use crate::models::{NewUser, Role, User};
use crate::validation::normalize_email;

pub mod migrator;
pub mod repositories;

pub use repositories::contact::ContactRepository;
pub use repositories::token::{StoredToken, TokenKind, TokenRepository};
pub use repositories::user::UserRepository;

/// Both storage contexts. Users and their owned tokens live in one database,
/// contact submissions in another.
#[derive(Clone)]
pub struct Store {
    pub users: DatabaseConnection,
    pub contacts: DatabaseConnection,
}

impl Store {
    pub async fn new(config: &GeneralConfig) -> Result<Self> {
        let users = connect::<migrator::UsersMigrator>(
            &config.users_database_url,
            config.max_db_connections,
            config.min_db_connections,
        )
        .await
        .context("Failed to open users database")?;

        let contacts = connect::<migrator::ContactsMigrator>(
            &config.contacts_database_url,
            config.max_db_connections,
            config.min_db_connections,
        )
        .await
        .context("Failed to open contacts database")?;

        Ok(Self { users, contacts })
    }

    pub async fn ping(&self) -> Result<()> {
        for conn in [&self.users, &self.contacts] {
            let backend = conn.get_database_backend();
            conn.query_one(Statement::from_string(backend, "SELECT 1".to_string()))
                .await?;
        }
        Ok(())
    }

    #[must_use]
    pub fn contact_repo(&self) -> ContactRepository {
        ContactRepository::new(self.contacts.clone())
    }

    #[must_use]
    pub fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.users.clone())
    }

    #[must_use]
    pub fn token_repo(&self) -> TokenRepository {
        TokenRepository::new(self.users.clone())
    }

    /// Creates the configured `SuperUser` unless an account with that username
    /// already exists. Returns the account either way.
    pub async fn seed_superuser(
        &self,
        superuser: &SuperUserConfig,
        security: &SecurityConfig,
    ) -> Result<User> {
        let repo = self.user_repo();

        if let Some(existing) = repo.get_by_username(&superuser.username).await? {
            info!("Superuser '{}' already present", existing.username);
            return Ok(existing);
        }

        let user = repo
            .insert(
                &NewUser {
                    username: superuser.username.clone(),
                    email: normalize_email(&superuser.email),
                    password: superuser.password.clone(),
                    role: Role::SuperUser,
                },
                security,
            )
            .await
            .context("Failed to seed superuser")?;

        info!("Seeded superuser '{}'", user.username);
        Ok(user)
    }

    /// Removes refresh and forgot-password tokens past their expiry.
    pub async fn purge_expired_tokens(&self) -> Result<u64> {
        self.token_repo().purge_expired(chrono::Utc::now()).await
    }
}

async fn connect<M: MigratorTrait>(
    db_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection> {
    let in_memory = db_url.contains(":memory:");

    if !in_memory {
        let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
        let path_str = path_str.split('?').next().unwrap_or(path_str);
        if let Some(parent) = Path::new(path_str).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        if !Path::new(path_str).exists() {
            std::fs::File::create(path_str)
                .with_context(|| format!("Failed to create database file {path_str}"))?;
        }
    }

    // Each in-memory SQLite connection is its own database.
    let (max_connections, min_connections) = if in_memory {
        (1, 1)
    } else {
        (max_connections, min_connections)
    };

    let mut opt = ConnectOptions::new(db_url.to_string());
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(600))
        .sqlx_logging(false);

    let conn = Database::connect(opt).await?;

    M::up(&conn, None).await?;

    info!(
        "Database {} connected & migrations applied (pool: {}-{})",
        db_url, min_connections, max_connections
    );

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unusable_database_directory_is_reported() {
        let blocker =
            std::env::temp_dir().join(format!("portfolio-db-blocker-{}", uuid::Uuid::new_v4()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let config = GeneralConfig {
            users_database_url: format!("sqlite:{}", blocker.join("nested/users.db").display()),
            contacts_database_url: "sqlite::memory:".to_string(),
            ..GeneralConfig::default()
        };

        let err = Store::new(&config).await.err().expect("store should fail");
        let chain = format!("{err:#}");
        assert!(chain.contains("Failed to create directory"), "{chain}");

        std::fs::remove_file(&blocker).ok();
    }
}
