//! Stockroom server binary.
//!
//! Starts the REST API over the catalog store and the assisted-intake
//! channel.
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 8000, data under the config dir)
//! stockroom
//!
//! # Specify binding and database location
//! stockroom --port 8080 --database /srv/stockroom/stock.db
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockroom::config::Config;
use stockroom::defaults::CatalogDefaults;
use stockroom::intake::{gemini::GeminiClient, IntakeDispatcher};
use stockroom::store::CatalogStore;
use stockroom::web::{self, AppState};

/// Stockroom - self-hosted stock tracking with an AI intake channel
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// SQLite database file (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load or create configuration
    let mut config = Config::load().unwrap_or_default();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(database) = args.database {
        config.storage.database = Some(database);
    }

    let database_path = config.database_path()?;
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent).context(format!(
            "Failed to create data directory: {}",
            parent.display()
        ))?;
    }
    info!("Database: {}", database_path.display());

    // Open the store and seed the fixed category structure
    let defaults = Arc::new(CatalogDefaults::builtin());
    let store = Arc::new(
        CatalogStore::open(&database_path, Arc::clone(&defaults))
            .context("Failed to open catalog database")?,
    );
    store.seed().await.context("Failed to seed catalog")?;

    // The credential is read once, here. Without it the intake channel
    // answers with a fixed advisory and never touches the network; catalog
    // operations are unaffected.
    let client = match config.ai.resolve_api_key() {
        Some(api_key) => Some(GeminiClient::new(api_key, config.ai.model.clone())?),
        None => {
            warn!("no AI credential configured; assisted intake is disabled");
            None
        }
    };
    let dispatcher = Arc::new(IntakeDispatcher::new(client));

    let state = AppState::new(store, dispatcher, config.icons_dir()?);

    // Build socket address
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    // Start the server
    web::run_server(state, addr).await
}
