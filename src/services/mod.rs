pub mod analysis_service;
pub mod chart_config;
pub mod chat_service;
pub mod document_service;
pub mod llm_service;
pub mod response_parser;
