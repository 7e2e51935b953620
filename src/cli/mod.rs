//! CLI module - command-line interface for the portfolio backend

mod commands;

pub use commands::{cmd_init_config, cmd_purge_tokens, cmd_seed};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Portfolio backend
/// Contact form, user accounts and transactional email over a JSON API
#[derive(Parser)]
#[command(name = "portfolio-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run migrations, seed the SuperUser and serve HTTP (default)
    Serve,

    /// Write a default config.toml to the working directory
    #[command(alias = "init")]
    InitConfig,

    /// Run migrations and seed the SuperUser, then exit
    Seed,

    /// Delete expired refresh and forgot-password tokens
    #[command(alias = "purge")]
    PurgeTokens,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}
