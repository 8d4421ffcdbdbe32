use tracing::{error, info};

use crate::models::{AnalysisResult, ChatResponse};
use crate::services::llm_service::LlmService;

const MISSING_KEY_MESSAGE: &str =
    "ERROR: Please configure a valid Gemini API key in your .env file to use the chat functionality.";

/// Answer a follow-up question, using the previous analysis as context
pub async fn handle_chat_message(
    llm_service: &LlmService,
    message: &str,
    context: Option<&AnalysisResult>,
) -> ChatResponse {
    if !llm_service.is_enabled() {
        return ChatResponse {
            message: MISSING_KEY_MESSAGE.to_string(),
        };
    }

    info!("Answering chat message ({} chars)", message.len());
    let prompt = build_chat_prompt(message, context);

    match llm_service.generate_completion(prompt).await {
        Ok(message) => ChatResponse { message },
        Err(e) => {
            error!("Chat error: {}", e);
            ChatResponse {
                message: format!("Error: {}", e),
            }
        }
    }
}

pub fn build_chat_prompt(message: &str, context: Option<&AnalysisResult>) -> String {
    let mut prompt = format!(
        "You are a helpful financial assistant answering questions about financial data. \
         Keep your answers clear, precise, and avoid technical jargon when possible.\n\n\
         Question: {}",
        message
    );

    let Some(context) = context else {
        return prompt;
    };

    if !context.simplified_story.is_empty() {
        prompt.push_str(&format!(
            "\n\nContext from previous financial analysis: {}",
            context.simplified_story
        ));
    }

    if !context.key_metrics.is_empty() {
        // A Vec of plain structs always serializes.
        let metrics = serde_json::to_string(&context.key_metrics).unwrap_or_default();
        prompt.push_str(&format!("\n\nKey metrics from the analysis: {}", metrics));
    }

    if let Some(recommendations) = context.recommendations.as_ref().filter(|r| !r.is_empty()) {
        prompt.push_str(&format!(
            "\n\nRecommendations from the analysis: {}",
            recommendations.join(", ")
        ));
    }

    prompt
}
