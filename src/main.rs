//! SiteGuard — WAF and Reverse Proxy (v1)
//!
//! A security gateway built with Tokio and Axum. It sits in front of an
//! origin web application, inspects every request and response, and
//! temporarily blocks clients that trip one of three abuse heuristics.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────┐
//!                   │                   SITEGUARD                      │
//!                   │                                                  │
//!   Client Request  │  ┌──────────────┐      ┌──────────────────────┐  │
//!   ────────────────┼─▶│ RequestGate  │─────▶│   proxy handler      │──┼──▶ Origin
//!                   │  │ ledger + rate│      │ (hyper-util client)  │  │    App
//!                   │  └──────┬───────┘      └──────────┬───────────┘  │
//!                   │         │ 403                     │              │
//!                   │         ▼                         ▼              │
//!   Client Response │  ┌──────────────┐      ┌──────────────────────┐  │
//!   ◀───────────────┼──│  rejection   │◀─────│    ResponseGate      │◀─┼──── Response
//!                   │  └──────────────┘      │ 401/404 trackers     │  │
//!                   │                        └──────────┬───────────┘  │
//!                   │                                   │              │
//!                   │  ┌────────────────────────────────▼───────────┐  │
//!                   │  │  SQLite: block ledger + suspicious log     │  │
//!                   │  │  dashboard data API reads from here        │  │
//!                   │  └────────────────────────────────────────────┘  │
//!                   └──────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siteguard::config::loader::load_config;
use siteguard::config::GuardConfig;
use siteguard::http::GuardServer;
use siteguard::store::SqliteStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siteguard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("siteguard v0.1.0 starting");

    // Load configuration; fall back to defaults when no file is given
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => GuardConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        database = %config.database.path,
        fail_open = config.detection.fail_open,
        "Configuration loaded"
    );

    // Open the block ledger database and create tables if missing
    let store = Arc::new(SqliteStore::open(&config.database.path)?);

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Initialize metrics server
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            siteguard::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Create and run the gateway
    let server = GuardServer::new(config, store);
    let shutdown = siteguard::Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
