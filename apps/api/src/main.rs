mod config;
mod errors;
mod llm_client;
mod routes;
mod scoring;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{GeminiClient, ScoreOracle};
use crate::routes::build_router;
use crate::scoring::validation::ImageSupport;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting post scoring API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the oracle client. A missing key is not fatal: the service
    // boots and answers scoring requests with 503 until one is provided.
    let oracle: Option<Arc<dyn ScoreOracle>> = match &config.gemini_api_key {
        Some(key) => {
            info!("Oracle client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(GeminiClient::new(key.clone())))
        }
        None => {
            warn!("GEMINI_API_KEY not set; scoring requests will be answered with 503");
            None
        }
    };

    let images = ImageSupport::detect();
    if !images.is_available() {
        warn!("Image support not compiled in; image requests will be answered with 501");
    }

    let state = AppState { oracle, images };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
