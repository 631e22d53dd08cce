//! Courier server binary.

use anyhow::{Context, Result};
use clap::Parser;
use courier_core::config::AppConfig;
use courier_server::workers::Scheduler;
use courier_server::{AppState, create_router, workers};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Courier - a document submission forwarding service
#[derive(Parser, Debug)]
#[command(name = "courierd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "COURIER_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Startup banner
    tracing::info!("Courier v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    // Check for COURIER_ environment variables (excluding COURIER_CONFIG which is just the path)
    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("COURIER_") && key != "COURIER_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: courierd --config /path/to/config.toml\n  \
             2. Environment variables: COURIER_SERVER__BIND=0.0.0.0:8080 \
             COURIER_INTERNAL_AUTH__TOKEN=YOUR_SERVICE_TOKEN courierd\n\n\
             Set COURIER_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("COURIER_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize storage backend
    let storage = courier_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    tracing::info!("Storage backend initialized");

    // Verify storage connectivity before accepting requests.
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!("Storage backend connectivity verified");

    // Initialize metadata store
    let metadata = courier_metadata::from_config(&config.metadata, config.repository.lock_ttl())
        .await
        .context("failed to initialize metadata store")?;
    tracing::info!("Metadata store initialized");

    // Create application state (validates configuration, builds HTTP clients)
    let shutdown_timeout = config.workers.shutdown_timeout();
    let bind = config.server.bind.clone();
    let state = AppState::new(config, storage, metadata)?;

    // Spawn the lifecycle workers
    let mut scheduler = Scheduler::new(shutdown_timeout);
    workers::spawn_all(&mut scheduler, state.clone());
    tracing::info!("Lifecycle workers spawned");

    // Create router
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = bind.parse().context("invalid bind address")?;

    tracing::info!("Listening on {}", addr);

    // Start server; ctrl-c stops accepting requests, then the workers are
    // wound down up to their shutdown deadline.
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    scheduler.shutdown().await;
    tracing::info!("Workers stopped, bye");

    Ok(())
}
