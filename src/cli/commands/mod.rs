mod init;
mod seed;
mod tokens;

pub use init::cmd_init_config;
pub use seed::cmd_seed;
pub use tokens::cmd_purge_tokens;
