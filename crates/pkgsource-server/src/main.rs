//! pkgsource - REST package source server

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pkgsource_core::{Ingestor, ManifestStore};
use tracing_subscriber::EnvFilter;

use pkgsource_server::{AppState, Cli, Config};

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli).context("Invalid configuration")?;

    init_logging(&config.log_level);
    tracing::info!(config = ?config, "Starting pkgsource");

    let addr = config.listen_addr()?;
    let store = Arc::new(ManifestStore::new());
    let ingestor = config.workers.map_or_else(Ingestor::default, Ingestor::new);
    ingestor
        .run(&config.manifest_dir, Arc::clone(&store))
        .await
        .context("Manifest ingestion failed")?;

    let state = Arc::new(AppState::new(config, store));
    pkgsource_server::serve(addr, state).await
}
