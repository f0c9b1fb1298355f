mod analysis;
mod chain;
mod config;
mod errors;
mod extract;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::quota::{QuotaPolicy, Unlimited};
use crate::analysis::Analyzer;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Roast API v{}", env!("CARGO_PKG_VERSION"));

    let analyzer = Analyzer::from_settings(&config.model)?;
    info!(
        "Model client initialized (model: {}, timeout: {}s)",
        config.model.model, config.model.request_timeout_secs
    );

    let quota: Arc<dyn QuotaPolicy> = Arc::new(Unlimited);
    info!(
        "Upload policy: max {} bytes, quota {}",
        config.max_upload_bytes,
        quota.name()
    );

    let state = AppState {
        analyzer: Arc::new(analyzer),
        quota,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web client's host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
