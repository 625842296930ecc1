//! Migration wizard backend.
//!
//! This binary exposes the migration pipeline as an HTTP API, one route
//! per wizard stage, for the frontend to drive.

mod handlers;
mod server;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use migrate_core::MigrationApi;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "migrate-rpc")]
#[command(about = "HTTP backend for the content migration wizard")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "4400")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Wizard state file
    #[arg(long, default_value = "./migration-state.json")]
    state_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting migration wizard backend");

    let api = MigrationApi::from_env()
        .context("incomplete environment: see SOURCE_REPO, DEST_REPO, SOURCE_EMAIL, SOURCE_PASSWORD, WRITE_API_KEY, MIGRATION_API_KEY")?;
    info!(
        source = %api.config().source_repo,
        destination = %api.config().dest_repo,
        cache = %api.config().cache_dir.display(),
        "configured"
    );

    let store = store::StateStore::new(&args.state_file);
    let state = Arc::new(server::AppState::new(api, store));

    let addr = server::start_server(state, &args.host, args.port).await?;
    info!("Wizard backend running on {}", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
