//! Academia · Online-Education Degree Platform Backend
//!
//! - Axum HTTP API (degree catalog, user accounts, calendar events)
//! - Hosted document-store / blob-storage / identity collaborators (reqwest),
//!   each degrading to an in-memory stand-in when unconfigured
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   DOCDB_BASE_URL      : document store endpoint (+ DOCDB_API_KEY)
//!   BLOB_BASE_URL       : blob storage endpoint (+ BLOB_BUCKET, BLOB_API_KEY,
//!                         optional BLOB_PUBLIC_BASE_URL)
//!   IDENTITY_BASE_URL   : identity provider endpoint (+ IDENTITY_API_KEY)
//!   BACKEND_CONFIG_PATH : path to TOML config (endpoints + collection names)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod error;
mod protocol;
mod builders;
mod store;
mod blobs;
mod identity;
mod state;
mod services;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (config + collaborator clients).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "academia_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
