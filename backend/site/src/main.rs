//! Outreach site service entry point.
//!
//! Loads the bundled campaign catalog and exposes it over a small Axum REST
//! API, together with per-visitor donation sessions. Donations are simulated:
//! they live in the session's in-memory ledger and vanish with it.

mod api;
mod config;
mod errors;
mod session;


use std::sync::Arc;
use std::time::Duration;

use campaign_ledger::{Catalog, SimulatedGateway};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use session::SessionStore;

/// How often idle sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    let catalog = Catalog::builtin()?;
    let shutdown = CancellationToken::new();

    let sessions = Arc::new(SessionStore::new(
        config.max_sessions,
        config.session_idle_ttl(),
    ));
    session::spawn_sweeper(sessions.clone(), SWEEP_INTERVAL, shutdown.clone());

    let state = Arc::new(api::ApiState {
        catalog: Arc::new(catalog),
        sessions,
        gateway: Arc::new(SimulatedGateway::new(config.gateway_latency())),
        config: config.clone(),
        shutdown: shutdown.clone(),
    });

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.bind_addr, config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
