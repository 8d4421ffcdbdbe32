use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A chart-library configuration decoded as strict JSON.
///
/// Only `type` is required; `data`, `options` and any other top-level keys
/// are handed to the client untouched. Anything that is not valid JSON is rejected rather than
/// evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ChartConfigError {
    #[error("chart configuration must be a JSON object")]
    NotAnObject,
    #[error("chart configuration has no \"type\" field")]
    MissingType,
    #[error("chart configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChartConfig {
    /// Decode a fenced code block's body into a configuration
    pub fn parse(code: &str) -> Result<Self, ChartConfigError> {
        let code = code.trim();
        let code = code.strip_suffix(';').unwrap_or(code).trim_end();

        if !code.starts_with('{') {
            return Err(ChartConfigError::NotAnObject);
        }

        let value: Value = serde_json::from_str(code)?;
        if !value.get("type").is_some_and(Value::is_string) {
            return Err(ChartConfigError::MissingType);
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Used when the reply had a code block that could not be decoded
    pub fn overview_fallback() -> Self {
        Self {
            chart_type: "bar".to_string(),
            data: json!({
                "labels": ["Data Point 1", "Data Point 2", "Data Point 3"],
                "datasets": [{
                    "label": "Financial Data",
                    "data": [12, 19, 3],
                    "backgroundColor": [
                        "rgba(75, 192, 192, 0.6)",
                        "rgba(54, 162, 235, 0.6)",
                        "rgba(255, 206, 86, 0.6)"
                    ],
                    "borderColor": [
                        "rgba(75, 192, 192, 1)",
                        "rgba(54, 162, 235, 1)",
                        "rgba(255, 206, 86, 1)"
                    ],
                    "borderWidth": 1
                }]
            }),
            options: standard_options("Financial Data Overview"),
            extra: Map::new(),
        }
    }

    /// Used when the reply had no code block at all
    pub fn default_fallback() -> Self {
        Self {
            chart_type: "bar".to_string(),
            data: json!({
                "labels": ["Financial Data"],
                "datasets": [{
                    "label": "Financial Overview",
                    "data": [10],
                    "backgroundColor": ["rgba(54, 162, 235, 0.5)"],
                    "borderColor": ["rgba(54, 162, 235, 1)"],
                    "borderWidth": 1
                }]
            }),
            options: standard_options("Default Chart - No data available"),
            extra: Map::new(),
        }
    }

    /// Shown alongside the missing-credentials placeholder result
    pub fn missing_api_key() -> Self {
        Self {
            chart_type: "bar".to_string(),
            data: json!({
                "labels": ["API Key Status"],
                "datasets": [{
                    "label": "Configuration Status",
                    "data": [0],
                    "backgroundColor": ["rgba(255, 99, 132, 0.5)"],
                    "borderColor": ["rgba(255, 99, 132, 1)"],
                    "borderWidth": 1
                }]
            }),
            options: json!({
                "scales": { "y": { "beginAtZero": true } }
            }),
            extra: Map::new(),
        }
    }

    /// Compact JSON text, as returned in `chartCode`
    pub fn to_code(&self) -> String {
        // Serializing a struct of strings and `Value`s cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn standard_options(title: &str) -> Value {
    json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "plugins": {
            "title": { "display": true, "text": title }
        },
        "scales": { "y": { "beginAtZero": true } }
    })
}
