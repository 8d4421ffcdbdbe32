use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::llm_service::LlmService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub llm_service: Arc<LlmService>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let llm_service = LlmService::new(&config.llm);
        Self::with_llm_service(config, llm_service)
    }

    pub fn with_llm_service(config: AppConfig, llm_service: LlmService) -> Self {
        Self {
            config: Arc::new(config),
            llm_service: Arc::new(llm_service),
        }
    }
}
