//! Seed command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_seed(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    let store = Store::new(&config.general).await?;
    let user = store
        .seed_superuser(&config.superuser, &config.security)
        .await?;

    let contacts = store.contact_repo().count().await?;

    println!("✓ Migrations applied");
    println!("✓ SuperUser: {} <{}> (id {})", user.username, user.email, user.id);
    println!("  {contacts} contact(s) on record");
    Ok(())
}
