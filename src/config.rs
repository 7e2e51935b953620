use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub superuser: SuperUserConfig,

    pub email: EmailConfig,

    pub contacts: ContactsConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Users, refresh tokens and forgot-password tokens live here.
    pub users_database_url: String,

    /// Contact-form submissions live here.
    pub contacts_database_url: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections per context (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections per context (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            users_database_url: "sqlite:data/users.db".to_string(),
            contacts_database_url: "sqlite:data/contacts.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 5080,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// HMAC key used to sign access tokens. Overridden by `PORTFOLIO_JWT_SECRET`.
    pub jwt_signing_key: String,

    pub jwt_issuer: String,

    pub jwt_audience: String,

    pub access_token_minutes: i64,

    pub refresh_token_days: i64,

    pub forgot_password_minutes: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            jwt_signing_key: String::new(),
            jwt_issuer: "portfolio-api".to_string(),
            jwt_audience: "portfolio-site".to_string(),
            access_token_minutes: 60,
            refresh_token_days: 7,
            forgot_password_minutes: 30,
        }
    }
}

/// Credentials for the account seeded on startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperUserConfig {
    pub username: String,

    pub email: String,

    /// Plaintext; hashed before it reaches the database.
    /// Overridden by `PORTFOLIO_SUPERUSER_PASSWORD`.
    pub password: String,
}

impl Default for SuperUserConfig {
    fn default() -> Self {
        Self {
            username: "superuser".to_string(),
            email: "owner@example.com".to_string(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// When false, outgoing mail is written to the log instead of SMTP.
    pub enabled: bool,

    pub smtp_host: String,

    pub smtp_port: u16,

    pub smtp_username: String,

    pub smtp_password: String,

    pub from_address: String,

    pub from_name: String,

    /// Base URL of the site, used to build links in templates.
    pub site_url: String,

    /// Receives a copy of every new contact-form submission.
    pub owner_address: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "no-reply@example.com".to_string(),
            from_name: "Portfolio".to_string(),
            site_url: "http://localhost:3000".to_string(),
            owner_address: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactsConfig {
    /// Minimum normalized Levenshtein similarity for a name search hit.
    pub similarity_threshold: f64,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            superuser: SuperUserConfig::default(),
            email: EmailConfig::default(),
            contacts: ContactsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies `.env` and
    /// environment overrides for secrets.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("portfolio").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".portfolio").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    /// Secrets are expected from the environment in deployments, so they win
    /// over whatever the file says.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str, target: &mut String| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };

        set("PORTFOLIO_JWT_SECRET", &mut self.security.jwt_signing_key);
        set("PORTFOLIO_SUPERUSER_USERNAME", &mut self.superuser.username);
        set("PORTFOLIO_SUPERUSER_EMAIL", &mut self.superuser.email);
        set("PORTFOLIO_SUPERUSER_PASSWORD", &mut self.superuser.password);
        set("PORTFOLIO_SMTP_USERNAME", &mut self.email.smtp_username);
        set("PORTFOLIO_SMTP_PASSWORD", &mut self.email.smtp_password);
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.jwt_signing_key.len() < 32 {
            anyhow::bail!(
                "JWT signing key must be at least 32 characters (set security.jwt_signing_key or PORTFOLIO_JWT_SECRET)"
            );
        }

        if self.security.access_token_minutes <= 0
            || self.security.refresh_token_days <= 0
            || self.security.forgot_password_minutes <= 0
        {
            anyhow::bail!("Token lifetimes must be greater than zero");
        }

        let threshold = self.contacts.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            anyhow::bail!("contacts.similarity_threshold must be in (0, 1], got {threshold}");
        }

        if self.email.enabled
            && (self.email.smtp_host.is_empty() || self.email.from_address.is_empty())
        {
            anyhow::bail!("SMTP host and from address cannot be empty when email is enabled");
        }

        if self.superuser.username.is_empty() || self.superuser.password.is_empty() {
            anyhow::bail!(
                "Superuser credentials are required (set superuser.password or PORTFOLIO_SUPERUSER_PASSWORD)"
            );
        }

        if !crate::validation::is_valid_email(self.superuser.email.trim()) {
            anyhow::bail!(
                "superuser.email is not a valid email address: '{}'",
                self.superuser.email
            );
        }

        Ok(())
    }
}
