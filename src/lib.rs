pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;
pub mod validation;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

/// Loads configuration from `--config` or the default search path.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => {
            dotenvy::dotenv().ok();
            let mut config = Config::load_from_path(path)?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => Config::load(),
    }
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let command = cli.command();

    if command == Commands::InitConfig {
        return cli::cmd_init_config();
    }

    let prometheus_handle = if command == Commands::Serve && config.observability.metrics_enabled
    {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    match command {
        Commands::Serve => serve(config, prometheus_handle).await,
        Commands::Seed => cli::cmd_seed(&config).await,
        Commands::PurgeTokens => cli::cmd_purge_tokens(&config).await,
        Commands::InitConfig => Ok(()),
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;
        let (layer, task) = tracing_loki::builder()
            .label("app", "portfolio-api")?
            .extra_field("pid", std::process::id().to_string())?
            .build_url(url)?;

        tokio::spawn(task);
        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn serve(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("portfolio-api v{} starting...", env!("CARGO_PKG_VERSION"));

    let server_enabled = config.server.enabled;
    let port = config.server.port;

    let state = api::create_app_state_from_config(config, prometheus_handle).await?;

    if !server_enabled {
        info!("HTTP server disabled in config; databases migrated and seeded");
        return Ok(());
    }

    let app = api::router(state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 API listening on http://{}/api/v1", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
