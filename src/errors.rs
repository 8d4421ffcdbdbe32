use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Upload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),
    #[error("{context}: {message}")]
    Internal { context: String, message: String },
}

impl AppError {
    pub fn internal(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AppError::Internal {
            context: context.into(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::PayloadTooLarge(limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "error": "File too large",
                    "message": format!("Uploads are limited to {} bytes", limit),
                })),
            )
                .into_response(),
            AppError::Internal { context, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": context, "message": message })),
            )
                .into_response(),
        }
    }
}

/// Failures talking to the generative-text provider.
///
/// The `Display` text is what ends up in front of the user, so the known
/// upstream failures carry a friendlier explanation than the raw API body.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Invalid or missing Gemini API key")]
    Disabled,
    #[error("Your Gemini API key is invalid. Please check your .env file and update it with a valid key.")]
    InvalidApiKey,
    #[error("The Gemini model endpoint is not available. This might be due to an outdated API or model name.")]
    ModelUnavailable,
    #[error("Billing issue with your Google Cloud account. Please ensure billing is enabled for your project.")]
    Billing,
    #[error("Failed to generate content from Gemini API: request timed out")]
    Timeout,
    #[error("Failed to generate content from Gemini API: {0}")]
    NetworkError(String),
    #[error("Failed to generate content from Gemini API: {0}")]
    ApiError(String),
    #[error("Failed to generate content from Gemini API: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Map an upstream error message onto one of the known failure kinds
    pub fn from_api_message(message: &str) -> Self {
        if message.contains("API key not valid") {
            LlmError::InvalidApiKey
        } else if message.contains("not found for API version") {
            LlmError::ModelUnavailable
        } else if message.contains("billing") {
            LlmError::Billing
        } else {
            LlmError::ApiError(message.to_string())
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::NetworkError(value.to_string())
        }
    }
}
