mod config;
mod errors;
mod llm_client;
mod models;
mod query;
mod routes;
mod state;
mod utilization;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::CompletionClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::utilization::dataset::EmployeeFeed;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on invalid values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Utilization API v{}", env!("CARGO_PKG_VERSION"));

    // Employee feed (validated once here, re-read per request)
    let feed = EmployeeFeed::from_config(config.dataset_path.as_deref()).await?;

    // Completion client
    let completion = CompletionClient::from_config(&config)?;
    info!(
        "Completion client initialized (model: {}, default backend: {:?})",
        completion.model(),
        config.default_backend
    );

    let state = AppState {
        feed,
        completion,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
