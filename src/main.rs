//! Zirka · HTML/CSS school backend
//!
//! - Axum HTTP + WebSocket API for lessons, quizzes, search, theme and the
//!   cosmic mission
//! - Live chat with organizer moderation and file attachments
//! - Assistant function endpoint (echo reply)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   APP_CONFIG_PATH  : path to TOML config (assistant, chat, theme, mission, extra quizzes)
//!   SYSTEM_THEME     : "light" | "dark", host preference used for the "system" theme mode
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod assistant;
mod chat;
mod config;
mod domain;
mod error;
mod highlight;
mod mission;
mod protocol;
mod quiz;
mod routes;
mod search;
mod seeds;
mod state;
mod telemetry;
mod theme;
mod transient;
mod util;

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = config::load_from_env();

  // Shared state: content banks, chat adapters, theme store, mission runs.
  let state = AppState::new(config);

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "zirka_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "zirka_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "zirka_backend", "Shutdown signal received");
}
