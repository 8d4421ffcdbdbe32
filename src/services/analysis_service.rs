use tracing::{error, info, warn};

use crate::errors::LlmError;
use crate::models::{AnalysisResult, KeyMetric, Trend};
use crate::services::chart_config::ChartConfig;
use crate::services::llm_service::LlmService;
use crate::services::response_parser::{self, CHART_HEADER, METRICS_HEADER, RECOMMENDATIONS_HEADER, STORY_HEADER};

/// Explain a financial document's text in plain language.
///
/// Never fails: a missing API key yields a fixed setup guide and an upstream
/// failure yields a result whose fields describe the error.
pub async fn analyze_financial_text(llm_service: &LlmService, text: &str) -> AnalysisResult {
    if !llm_service.is_enabled() {
        warn!("Gemini API key missing, returning configuration guidance instead of an analysis");
        return missing_api_key_result();
    }

    info!("Analyzing financial text ({} chars)", text.len());
    let prompt = build_analysis_prompt(text);

    match llm_service.generate_completion(prompt).await {
        Ok(response) => {
            let result = response_parser::parse_analysis_response(&response);
            info!(
                "Analysis parsed: story {} chars, {} metrics, {} recommendations",
                result.simplified_story.len(),
                result.key_metrics.len(),
                result.recommendations.as_ref().map_or(0, Vec::len)
            );
            result
        }
        Err(LlmError::Disabled) => missing_api_key_result(),
        Err(e) => {
            error!("Analysis error: {}", e);
            error_result(&e)
        }
    }
}

/// Build the analysis prompt with the layout the response parser expects
pub fn build_analysis_prompt(text: &str) -> String {
    format!(
        r#"Take the detailed financial report provided, which includes technical terms, specific financial metrics, and industry jargon, and convert it into plain, everyday language that anyone can understand. Make sure to extract and explain every key detail from the report, including growth rates, risk indicators, red flags such as high non-performing assets, aggressive lending practices, underreported risks, poor governance issues, and any other financial metrics. Your simplified version should clearly explain what these details mean about the company's (or bank's/brand's) current situation and future outlook, using relatable analogies where appropriate. The explanation should be generic enough to apply to any company, brand, bank, or business, and it should guide the reader on whether to approach the company with caution or confidence.

1. A simplified story explaining what this data means in plain language without technical jargon.
2. Key metrics and their significance. Monetary values must be expressed in Rupees only. Provide them as a JSON array in the format: [{{"name": "Metric Name", "value": "Value", "trend": "positive/negative/neutral", "significance": "Brief explanation"}}]
3. Actionable recommendations based on this data.
4. A Chart.js (version 3) configuration that visualizes key aspects of this data. Make the chart visually appealing and insightful.

IMPORTANT: The chart configuration must be strict JSON:
- A single object starting with {{ and ending with }}
- Contains "type", "data" and "options" properties
- Sets "responsive": true and "maintainAspectRatio": false in options
- All keys and strings use double quotes
- No functions, comments, semicolons, variable declarations or Chart constructor calls

Format your response as follows:

{story}
[Provide the simplified explanation here]

{metrics}
[JSON array of key metrics as specified above]

{recommendations}
- [Recommendation 1]
- [Recommendation 2]
- [etc.]

{chart}
```json
{{
  "type": "bar",
  "data": {{
    "labels": ["Label1", "Label2"],
    "datasets": [{{
      "label": "Data",
      "data": [10, 20],
      "backgroundColor": ["rgba(75, 192, 192, 0.6)"],
      "borderColor": ["rgba(75, 192, 192, 1)"],
      "borderWidth": 1
    }}]
  }},
  "options": {{
    "responsive": true,
    "maintainAspectRatio": false,
    "plugins": {{
      "title": {{ "display": true, "text": "Chart Title" }}
    }},
    "scales": {{
      "y": {{ "beginAtZero": true }}
    }}
  }}
}}
```

Financial data:
{text}
"#,
        story = STORY_HEADER,
        metrics = METRICS_HEADER,
        recommendations = RECOMMENDATIONS_HEADER,
        chart = CHART_HEADER,
        text = text,
    )
}

/// Returned instead of calling the model when no usable API key is configured
pub fn missing_api_key_result() -> AnalysisResult {
    AnalysisResult {
        simplified_story: "ERROR: Please configure a valid Gemini API key in your .env file to analyze financial data.".to_string(),
        key_metrics: vec![KeyMetric::new(
            "API Configuration",
            "Missing",
            Trend::Negative,
            "The application requires a valid Google Gemini API key to function.",
        )],
        recommendations: Some(vec![
            "Set up a Google Cloud account if you don't have one".to_string(),
            "Generate a Gemini API key at https://ai.google.dev/".to_string(),
            "Add the key to your .env file as GEMINI_API_KEY=your_actual_key".to_string(),
            "Make sure you've enabled the Gemini API in your Google Cloud Console".to_string(),
            "Restart the server".to_string(),
        ]),
        chart_code: Some(ChartConfig::missing_api_key().to_code()),
    }
}

fn error_result(err: &LlmError) -> AnalysisResult {
    AnalysisResult {
        simplified_story: format!("Error analyzing financial data: {}", err),
        key_metrics: vec![KeyMetric::new(
            "Error",
            &err.to_string(),
            Trend::Negative,
            "There was an error processing your request.",
        )],
        recommendations: Some(vec![
            "Verify your Gemini API key is correct".to_string(),
            "Make sure you've enabled the Gemini API in your Google Cloud Console".to_string(),
            "Check that billing is enabled for your Google Cloud project".to_string(),
            "Try again after fixing these potential issues".to_string(),
        ]),
        chart_code: None,
    }
}
