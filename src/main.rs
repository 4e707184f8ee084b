//! Cognitive Assessment Backend
//!
//! - Axum HTTP JSON API: registration, login, question delivery, test
//!   submission with server-side scoring, and result history
//! - In-memory transactional store seeded with the built-in 50-question battery
//! - Static SPA fallback (STATIC_DIR/index.html)
//!
//! Important env variables:
//!   PORT            : u16 (default 3000)
//!   STATIC_DIR      : front-end directory (default "./static")
//!   APP_CONFIG_PATH : path to TOML config (session TTL + optional extra test banks)
//!   LOG_LEVEL       : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod error;
mod seeds;
mod evaluator;
mod store;
mod auth;
mod state;
mod protocol;
mod logic;
mod routes;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::config::load_config_from_env;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = load_config_from_env();
  let addr = config.listen_addr();

  // Shared application state (store seeded with the test banks, sessions).
  let state = Arc::new(AppState::new(config).await);

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  let listener = TcpListener::bind(addr).await?;
  info!(target: "iq_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "iq_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "iq_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "iq_backend", "Shutdown signal received");
}
