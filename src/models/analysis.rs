use serde::{Deserialize, Deserializer, Serialize};

/// Parsed result of one document analysis.
///
/// Every field is filled independently, so a reply that only partly follows
/// the requested format still yields whatever sections could be recovered.
/// The same shape comes back from the client as chat context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    #[serde(deserialize_with = "null_as_default")]
    pub simplified_story: String,
    #[serde(deserialize_with = "null_as_default")]
    pub key_metrics: Vec<KeyMetric>,
    pub recommendations: Option<Vec<String>>,
    pub chart_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMetric {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "string_or_scalar")]
    pub value: String,
    #[serde(deserialize_with = "null_as_default")]
    pub trend: Trend,
    #[serde(deserialize_with = "null_as_default")]
    pub significance: String,
}

impl KeyMetric {
    pub fn new(name: &str, value: &str, trend: Trend, significance: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            trend,
            significance: significance.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Trend {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl From<String> for Trend {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" | "up" | "increase" => Trend::Positive,
            "negative" | "down" | "decrease" => Trend::Negative,
            _ => Trend::Neutral,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Models regularly emit `"value": 12.5` instead of a string
fn string_or_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let result = AnalysisResult {
            simplified_story: "story".to_string(),
            key_metrics: vec![KeyMetric::new("Revenue", "₹10 Cr", Trend::Positive, "Up")],
            recommendations: None,
            chart_code: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["simplifiedStory"], "story");
        assert_eq!(json["keyMetrics"][0]["trend"], "positive");
        assert!(json["recommendations"].is_null());
        assert!(json["chartCode"].is_null());
    }

    #[test]
    fn test_metric_accepts_numeric_value_and_loose_trend() {
        let metric: KeyMetric = serde_json::from_str(
            r#"{"name": "NPA Ratio", "value": 4.5, "trend": "Negative", "significance": "High"}"#,
        )
        .unwrap();
        assert_eq!(metric.value, "4.5");
        assert_eq!(metric.trend, Trend::Negative);
    }

    #[test]
    fn test_metric_unknown_trend_is_neutral() {
        let metric: KeyMetric =
            serde_json::from_str(r#"{"name": "Margin", "value": "12%", "trend": "positive/negative"}"#)
                .unwrap();
        assert_eq!(metric.trend, Trend::Neutral);
        assert_eq!(metric.significance, "");
    }

    #[test]
    fn test_metric_null_fields_fall_back_to_defaults() {
        let metric: KeyMetric = serde_json::from_str(
            r#"{"name": null, "value": null, "trend": null, "significance": null}"#,
        )
        .unwrap();
        assert_eq!(metric, KeyMetric::default());
        assert_eq!(metric.trend, Trend::Neutral);
    }

    #[test]
    fn test_context_with_null_story_and_metrics() {
        let context: AnalysisResult =
            serde_json::from_str(r#"{"simplifiedStory": null, "keyMetrics": null, "chartCode": null}"#)
                .unwrap();
        assert_eq!(context, AnalysisResult::default());
    }

    #[test]
    fn test_partial_context_deserializes() {
        let context: AnalysisResult =
            serde_json::from_str(r#"{"simplifiedStory": "The bank is growing."}"#).unwrap();
        assert_eq!(context.simplified_story, "The bank is growing.");
        assert!(context.key_metrics.is_empty());
        assert!(context.recommendations.is_none());
    }
}
