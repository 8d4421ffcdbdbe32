use serde::{Deserialize, Serialize};

use super::AnalysisResult;

/// Chat turn sent by the client, carrying the previous analysis as context
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub context: Option<AnalysisResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
}
