use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::LlmConfig;
use crate::errors::LlmError;

/// Trait for generative-text providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate_completion(&self, prompt: String) -> Result<String, LlmError>;
}

/// Gemini `generateContent` request/response structures
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GeminiResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Google Gemini provider implementation
pub struct GeminiProvider {
    api_key: String,
    endpoint: String,
    generation_config: GenerationConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self {
            api_key,
            endpoint: config.endpoint(),
            generation_config: GenerationConfig {
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
            },
            client,
        })
    }

    async fn call_gemini(&self, request: &GeminiRequest) -> Result<GeminiResponse, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Gemini API error (HTTP {}): {}", status, error_text);

            return Err(match serde_json::from_str::<GeminiErrorBody>(&error_text) {
                Ok(body) => LlmError::from_api_message(&body.error.message),
                Err(_) => LlmError::ApiError(format!("HTTP {}: {}", status, error_text)),
            });
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate_completion(&self, prompt: String) -> Result<String, LlmError> {
        info!(
            "Making request to Gemini API (prompt: {} chars, max_output_tokens: {})",
            prompt.len(),
            self.generation_config.max_output_tokens
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: Some(prompt) }],
            }],
            generation_config: self.generation_config,
        };

        let text = self.call_gemini(&request).await?.into_text().ok_or_else(|| {
            error!("Unexpected Gemini API response structure");
            LlmError::InvalidResponse("Unexpected response format from Gemini API".to_string())
        })?;

        info!("Gemini completion received ({} chars)", text.len());
        Ok(text)
    }
}

/// Entry point for everything that talks to the model.
///
/// Holds no provider when the API key is missing or still the sample
/// placeholder; callers check [`LlmService::is_enabled`] and answer with a
/// canned result instead of making a network call.
pub struct LlmService {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl LlmService {
    pub fn new(config: &LlmConfig) -> Self {
        let provider = match config.usable_api_key() {
            Some(api_key) => match GeminiProvider::new(api_key.to_string(), config) {
                Ok(provider) => {
                    info!("Initializing LLM service with Gemini model: {}", config.model);
                    Some(Arc::new(provider) as Arc<dyn LlmProvider>)
                }
                Err(e) => {
                    error!("Failed to create Gemini client: {}. LLM features disabled.", e);
                    None
                }
            },
            None => {
                warn!("Invalid or missing Gemini API key. Please set GEMINI_API_KEY in your .env file.");
                None
            }
        };

        Self { provider }
    }

    #[cfg(test)]
    pub fn with_provider(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn generate_completion(&self, prompt: String) -> Result<String, LlmError> {
        let provider = self.provider.as_ref().ok_or(LlmError::Disabled)?;

        provider.generate_completion(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    /// Serve a fake `generateContent` endpoint and return its base URL
    async fn spawn_fake_gemini(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/v1/models/*model_action",
            post(move |Query(params): Query<HashMap<String, String>>, Json(request): Json<Value>| {
                let body = body.clone();
                async move {
                    assert_eq!(params.get("key").map(String::as_str), Some("test-key"));
                    assert_eq!(request["generationConfig"]["topK"], 40);
                    assert!(request["contents"][0]["parts"][0]["text"].is_string());
                    (status, Json(body))
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config_for(base_url: String) -> LlmConfig {
        LlmConfig {
            api_key: Some("test-key".to_string()),
            base_url,
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_service_disabled_without_key() {
        let service = LlmService::new(&LlmConfig::default());
        assert!(!service.is_enabled());
    }

    #[test]
    fn test_service_disabled_with_placeholder_key() {
        let config = LlmConfig {
            api_key: Some(crate::config::PLACEHOLDER_API_KEY.to_string()),
            ..LlmConfig::default()
        };
        assert!(!LlmService::new(&config).is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_service_returns_disabled_error() {
        let result = LlmService::disabled().generate_completion("test".to_string()).await;
        assert!(matches!(result, Err(LlmError::Disabled)));
    }

    #[tokio::test]
    async fn test_gemini_returns_candidate_text() {
        let base_url = spawn_fake_gemini(
            StatusCode::OK,
            json!({"candidates": [{"content": {"parts": [{"text": "# Simplified Story\nHello"}]}}]}),
        )
        .await;
        let service = LlmService::new(&config_for(base_url));
        assert!(service.is_enabled());

        let text = service.generate_completion("prompt".to_string()).await.unwrap();
        assert_eq!(text, "# Simplified Story\nHello");
    }

    #[tokio::test]
    async fn test_gemini_invalid_key_is_rewritten() {
        let base_url = spawn_fake_gemini(
            StatusCode::BAD_REQUEST,
            json!({"error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}}),
        )
        .await;
        let service = LlmService::new(&config_for(base_url));

        let err = service.generate_completion("prompt".to_string()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidApiKey));
    }

    #[tokio::test]
    async fn test_gemini_missing_candidates_is_invalid_response() {
        let base_url = spawn_fake_gemini(StatusCode::OK, json!({"promptFeedback": {}})).await;
        let service = LlmService::new(&config_for(base_url));

        let err = service.generate_completion("prompt".to_string()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
        assert!(err.to_string().contains("Unexpected response format"));
    }
}
