mod analysis;
mod chat;

pub use analysis::{AnalysisResult, AnalyzeTextRequest, KeyMetric, Trend};
pub use chat::{ChatRequest, ChatResponse};
