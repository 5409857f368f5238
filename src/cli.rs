//! Command line interface.
//!
//! `serve` runs the HTTP server and is the default when no subcommand is
//! given. The other commands manage the database out of band.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::auth::generate_credentials;
use crate::config::{Config, DatabaseLocation};
use crate::store::{CountyDb, CountyStore, RefreshOutcome};
use crate::tasks::spawn_refresh_task;
use crate::upstream::{build_http_client, HttpBanFeed};

/// Every Texas county, one per line.
pub const TEXAS_COUNTIES: &str = include_str!("../data/texas_counties.txt");

#[derive(Parser)]
#[command(name = "burnban")]
#[command(about = "County burn ban lookup service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Create the schema and seed county rows
    Init {
        /// File with one county name per line (default: bundled Texas list)
        #[arg(short, long)]
        counties: Option<PathBuf>,
        /// Delete existing county rows before seeding
        #[arg(long)]
        reset: bool,
    },

    /// Create an API consumer and print its key and secret
    GenerateKey,

    /// Fetch the bulletin now, ignoring the staleness window
    Refresh,
}

/// Dispatches a parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => cmd_serve().await,
        Commands::Init { counties, reset } => cmd_init(counties.as_deref(), reset).await,
        Commands::GenerateKey => cmd_generate_key().await,
        Commands::Refresh => cmd_refresh().await,
    }
}

/// Names from a county list. Blank lines and `#` comments are skipped.
pub fn parse_county_list(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

async fn cmd_serve() -> anyhow::Result<()> {
    info!("Starting burn ban server");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: feed={}, database={:?}, port={}, refresh_threshold={}s, rate_limit={}/min, trust_forwarded_for={}, auth={}",
        config.feed_url,
        config.database,
        config.server_port,
        config.refresh_threshold.as_secs(),
        config.rate_limit_per_minute,
        config.trust_forwarded_for,
        config.auth.is_some()
    );

    let db = CountyDb::connect(&config.database).await?;
    if db.list_counties().await?.is_empty() {
        let seeded = db.seed_counties(parse_county_list(TEXAS_COUNTIES)).await?;
        info!("Empty county table, seeded {} bundled counties", seeded);
    }

    let http = build_http_client(config.http_timeout)?;
    let state = AppState::from_config(&config, db, http);
    if state.auth.is_none() {
        warn!("JWT_SECRET not set, lookups do not require a token");
    }

    let refresh_handle = config
        .refresh_interval
        .map(|interval| spawn_refresh_task(state.store.clone(), interval));

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(refresh_handle))
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn cmd_init(counties: Option<&Path>, reset: bool) -> anyhow::Result<()> {
    let location = DatabaseLocation::from_env();
    let db = CountyDb::connect(&location).await?;

    if reset {
        let removed = db.clear_counties().await?;
        println!("Removed {} existing counties", removed);
    }

    let seeded = match counties {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            db.seed_counties(parse_county_list(&text)).await?
        }
        None => db.seed_counties(parse_county_list(TEXAS_COUNTIES)).await?,
    };

    let total = db.list_counties().await?.len();
    println!("Seeded {} new counties ({} total) in {:?}", seeded, total, location);
    Ok(())
}

async fn cmd_generate_key() -> anyhow::Result<()> {
    let db = CountyDb::connect(&DatabaseLocation::from_env()).await?;
    let credentials = generate_credentials();
    db.create_consumer(&credentials).await?;

    println!("Key: {}", credentials.api_key);
    println!("Secret: {}", credentials.api_secret);
    println!("The secret is not stored and cannot be shown again.");
    Ok(())
}

async fn cmd_refresh() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let db = CountyDb::connect(&config.database).await?;
    let http = build_http_client(config.http_timeout)?;
    let feed = HttpBanFeed::new(http, config.feed_url.clone());
    let store = CountyStore::new(db, Arc::new(feed), config.refresh_threshold);

    match store.force_refresh().await {
        RefreshOutcome::Refreshed { banned, matched, at } => {
            println!(
                "Refreshed at {}: {} counties listed, {} matched",
                at.to_rfc3339(),
                banned,
                matched
            );
        }
        RefreshOutcome::Failed(reason) => anyhow::bail!("refresh failed: {}", reason),
        RefreshOutcome::Fresh => {}
    }

    for county in store.db().list_counties().await? {
        if county.burn_ban {
            println!("  {}", county.name);
        }
    }
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the refresh task and allows graceful shutdown.
async fn shutdown_signal(refresh_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = refresh_handle {
        handle.abort();
        warn!("Refresh task aborted");
    }
}
