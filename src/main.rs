use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pr_review_service::api::{self, AppState};
use pr_review_service::config::AppConfig;
use pr_review_service::database::Database;

#[derive(Parser)]
#[command(name = "pr-review-service")]
#[command(about = "Assigns pull request reviewers from the author's team")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to an optional ./config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database URL, overrides the configured value
    #[arg(long)]
    database_url: Option<String>,

    /// Port to listen on, overrides the configured value
    #[arg(long)]
    port: Option<u16>,

    /// Apply migrations and exit
    #[arg(long)]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_review_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Starting PR review service");

    let mut config = AppConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    info!("Configuration loaded ({} environment)", config.environment);

    let database = Database::connect(&config.database_url, &config.database)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))?;

    database
        .run_migrations()
        .await
        .context("failed to run database migrations")?;

    if cli.migrate_only {
        database.close().await;
        return Ok(());
    }

    let app = api::router(AppState::new(database.clone()));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // keep serving without a shutdown trigger
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
