//! Event Registry - JSON-file-backed event registration service

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use event_registry::{
    api::build_app,
    config::AppConfig,
    notify::LogNotifier,
    ratelimit::{spawn_sweeper, AdmissionLimiter},
    Registry,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "event-registry")]
#[command(version)]
#[command(about = "Event registration service backed by JSON files")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "EVENT_REGISTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Data directory (overrides config)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Token signing secret (overrides config)
        #[arg(long, env = "EVENT_REGISTRY_TOKEN_SECRET", hide_env_values = true)]
        token_secret: Option<String>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("event_registry={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Serve {
            host,
            port,
            data_dir,
            token_secret,
        } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(dir) = data_dir {
                config.storage.data_dir = dir;
            }
            if let Some(secret) = token_secret {
                config.auth.token_secret = secret;
            }
            run_server(config).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Starting event registry");

    let registry = Arc::new(Registry::open(&config, Arc::new(LogNotifier)).await?);
    let limiter = Arc::new(AdmissionLimiter::from_config(&config.rate_limit));
    let sweeper = spawn_sweeper(
        limiter.clone(),
        Duration::from_secs(config.rate_limit.sweep_interval_secs),
    );

    let app = build_app(registry, limiter, &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}. Press Ctrl+C to stop.", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    tracing::info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

fn show_config(config: Option<&AppConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
