//! # Trip Tracking Server
//!
//! Serve the trip tracking command protocol over TCP.
//!
//! ## Design Principles
//!
//! 1. **Single Responsibility**: Framing, routing and handlers live in
//!    separate modules.
//! 2. **Async First**: Tokio runs one task per connection.
//! 3. **Fail-Open Defaults**: Protocol and command errors stay inside the
//!    connection that caused them.
//! 4. **Explicit Wiring**: The store is built here and passed down; nothing is
//!    global.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trk_server::{Server, ServerConfig, TrackingService, seed};
use trk_store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let service = Arc::new(TrackingService::new(Arc::new(MemoryStore::new())));

    if config.seed_defaults {
        seed::seed_default_trips(&service).await;
    }

    let server = Server::bind(&config, Arc::clone(&service))
        .with_context(|| format!("cannot listen on {}", config.socket_addr()))?;
    let handle = server.start().context("cannot start accept loop")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown requested");

    let snapshot = handle.stop().await;
    info!(
        requests = snapshot.requests_total,
        failures = snapshot.failures_total,
        discarded = snapshot.frames_discarded,
        sessions = snapshot.sessions_total,
        "server stopped"
    );
    Ok(())
}
