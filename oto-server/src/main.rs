//! OTO Shipping Bridge Server
//!
//! Connects a commerce host to the OTO shipping aggregator: pushes
//! fulfillments out, reconciles tracking callbacks back in.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use oto_core::config::ConfigStore;
use oto_core::processors::{OtoProvider, TokenRefresher};
use oto_core::store::PgStore;
use oto_sdk::client::OtoClient;
use server::{build_router, run_server};
use shutdown::{spawn_config_reload_handler, spawn_token_persister};
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// OTO shipping bridge
#[derive(Parser, Debug)]
#[command(name = "oto-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./oto-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting oto-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let listen_addr = loaded_config.listen;
    let refresh_interval = loaded_config.token_refresh_interval;
    let client = OtoClient::new(loaded_config.oto.base_url.clone());
    let settings = ConfigStore::new(loaded_config.oto);
    let host = ConfigStore::new(loaded_config.host);

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Background token rotation and its write-back to the config file
    let refresher = TokenRefresher::new(
        Arc::new(client.clone()),
        settings.clone(),
        refresh_interval,
        shutdown_rx.clone(),
    );
    let refresher_handle = tokio::spawn(refresher.run());
    let persister_handle =
        spawn_token_persister(settings.clone(), config_loader.clone(), shutdown_rx);

    let state = AppState::new(
        Arc::new(PgStore::new(db_pool.clone())),
        Arc::new(OtoProvider::new(client, settings.clone())),
        settings,
        host,
    );

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop background tasks
    shutdown_notify.notify_one();
    let _ = shutdown_tx.send(true);
    let _ = refresher_handle.await;
    let _ = persister_handle.await;

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
