use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::warn;

pub async fn api_not_found(uri: Uri) -> impl IntoResponse {
    warn!("No API route for {}", uri);
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "API endpoint not found" })),
    )
}

/// Non-API paths when no client bundle is being served
pub async fn development_root() -> &'static str {
    "Backend server running in development mode."
}
