//! # birdbook-server
//!
//! HTTP API over the Birds, Pairs and Chicks sheets.

mod config;
mod credentials;
mod routes;

use clap::Parser;
use config::ServerConfig;
use routes::{create_router, AppState};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    let store = config
        .build_store()
        .inspect_err(|e| tracing::error!("startup failed: {e}"))?;

    let app = create_router(AppState::new(Arc::new(store)));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("birdbook-server listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
