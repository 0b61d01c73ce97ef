//! # tandem-server
//!
//! Registry node for the Tandem couples app.
//!
//! This binary exposes the heart registry over a REST API (axum):
//! - **Pairing**: create a heart, claim it with an invite code (the join
//!   transaction), fetch and rename it
//! - **Live watch**: per-heart SSE stream of committed snapshots
//! - **Accounts**: registration and lookup
//! - **Content**: letters, mood check-ins, question answers, and shared
//!   music tracks, scoped by heart code
//!
//! State is held in the in-memory reference store; a hosted document
//! database backend plugs in behind the same `RegistryStore` trait.

mod api;
mod config;
mod error;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tandem_registry::{HeartRegistry, MemoryStore};

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tandem_server=debug")),
        )
        .init();

    info!("Starting Tandem registry server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    info!(
        instance = %config.instance_name,
        registration_open = config.registration_open,
        "Instance settings"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize the registry
    // -----------------------------------------------------------------------
    let registry = Arc::new(HeartRegistry::new(MemoryStore::new()));

    let app_state = AppState {
        registry,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
