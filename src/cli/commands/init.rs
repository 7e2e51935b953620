//! Init config command handler

use crate::config::Config;

pub fn cmd_init_config() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("✓ Config file created. Set security.jwt_signing_key and superuser.password");
        println!("  (or PORTFOLIO_JWT_SECRET / PORTFOLIO_SUPERUSER_PASSWORD), then run again.");
    } else {
        println!("config.toml already exists, leaving it untouched.");
    }
    Ok(())
}
