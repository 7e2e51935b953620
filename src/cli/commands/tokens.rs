//! Purge expired tokens command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_purge_tokens(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general).await?;
    let removed = store.purge_expired_tokens().await?;

    if removed == 0 {
        println!("No expired tokens.");
    } else {
        println!("✓ Removed {removed} expired token(s)");
    }
    Ok(())
}
