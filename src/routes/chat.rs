use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{ChatRequest, ChatResponse};
use crate::routes::payload::Payload;
use crate::services::chat_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(chat))
}

/// POST /api/chat
///
/// Request body: `{"message": "...", "context": <previous AnalysisResult>}`
async fn chat(
    State(state): State<AppState>,
    Payload(request): Payload<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let request = request.unwrap_or_default();
    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No message provided".to_string()))?;

    info!(
        "POST /api/chat - {} chars, context: {}",
        message.len(),
        request.context.is_some()
    );

    let response =
        chat_service::handle_chat_message(&state.llm_service, &message, request.context.as_ref())
            .await;
    Ok(Json(response))
}
