mod app;
mod config;
mod errors;
mod logging;
mod models;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::logging::{init_logging, LoggingConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    match (config.llm.has_api_key(), config.llm.usable_api_key()) {
        (_, Some(_)) => tracing::info!("Gemini API: configured (model: {})", config.llm.model),
        (true, None) => tracing::warn!("Gemini API: placeholder key found, analysis will return setup guidance"),
        (false, None) => tracing::warn!("Gemini API: missing, analysis will return setup guidance"),
    }
    tracing::info!("CORS origin: {}", config.cors_origin);
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Upload limit: {} bytes", config.max_upload_bytes);

    let state = AppState::new(config);
    let app = app::create_app(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Finsight backend running at http://{}/", addr);
    tracing::info!("API routes: /api/analyze/{{text,pdf,excel}}, /api/chat, /api/health, /api/debug");

    axum::serve(listener, app).await?;

    Ok(())
}
