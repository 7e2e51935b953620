use anyhow::Context;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ContactService, EmailService, Mailer, SeaOrmContactService, SeaOrmUserService, UserService,
    mailer_from_config,
};

/// Everything the HTTP layer and CLI commands share.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub email_service: Arc<EmailService>,

    pub contact_service: Arc<dyn ContactService>,

    pub user_service: Arc<dyn UserService>,
}

impl SharedState {
    /// Builds the mailer from `[email]`.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer = mailer_from_config(&config.email).context("Failed to configure mailer")?;
        Self::with_mailer(config, mailer).await
    }

    /// Validates config, opens both databases (running migrations), seeds the
    /// SuperUser and wires the services.
    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Store::new(&config.general).await?;
        store
            .seed_superuser(&config.superuser, &config.security)
            .await?;

        let email_service = Arc::new(
            EmailService::new(mailer, config.email.clone())
                .context("Failed to load email templates")?,
        );

        let contact_service = Arc::new(SeaOrmContactService::new(
            store.clone(),
            email_service.clone(),
            config.contacts.similarity_threshold,
        )) as Arc<dyn ContactService>;

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            email_service.clone(),
            config.security.clone(),
            config.superuser.username.clone(),
        )) as Arc<dyn UserService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            email_service,
            contact_service,
            user_service,
        })
    }
}
