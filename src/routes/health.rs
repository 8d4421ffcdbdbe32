use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/debug", get(debug))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    info!("GET /api/health - Health check");
    let gemini = if state.llm_service.is_enabled() { "configured" } else { "missing" };
    Json(json!({
        "status": "healthy",
        "gemini": gemini,
    }))
}

async fn debug(State(state): State<AppState>) -> Json<Value> {
    info!("GET /api/debug");
    Json(json!({
        "message": "Debug endpoint working",
        "env": {
            "environment": state.config.environment,
            "port": state.config.port,
            "corsOrigin": state.config.cors_origin,
            "geminiConfigured": state.llm_service.is_enabled(),
        },
        "routes": {
            "apiAnalyze": "/api/analyze/*",
            "apiChat": "/api/chat",
            "apiHealth": "/api/health",
        }
    }))
}
