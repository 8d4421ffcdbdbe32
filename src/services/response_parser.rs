use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, warn};

use crate::models::{AnalysisResult, KeyMetric};
use crate::services::chart_config::ChartConfig;

pub const STORY_HEADER: &str = "# Simplified Story";
pub const METRICS_HEADER: &str = "# Key Metrics";
pub const RECOMMENDATIONS_HEADER: &str = "# Recommendations";
pub const CHART_HEADER: &str = "# Chart Code";

static METRICS_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").expect("invalid metrics regex"));

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|javascript|js)?[ \t]*\r?\n(.*?)```").expect("invalid fence regex"));

/// Split a model reply into the four analysis sections.
///
/// Each section is recovered on its own and degrades to an empty or default
/// value when the model did not follow the requested layout. Nothing in here
/// fails the request.
pub fn parse_analysis_response(response: &str) -> AnalysisResult {
    AnalysisResult {
        simplified_story: extract_story(response),
        key_metrics: extract_metrics(response),
        recommendations: extract_recommendations(response),
        chart_code: Some(extract_chart(response).to_code()),
    }
}

/// Text after `header`, up to `next_header` or the end of the reply
fn section<'a>(response: &'a str, header: &str, next_header: Option<&str>) -> Option<&'a str> {
    let start = response.find(header)? + header.len();
    let rest = &response[start..];
    let end = next_header
        .and_then(|next| rest.find(next))
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

pub fn extract_story(response: &str) -> String {
    section(response, STORY_HEADER, Some(METRICS_HEADER))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

pub fn extract_metrics(response: &str) -> Vec<KeyMetric> {
    let Some(region) = section(response, METRICS_HEADER, Some(RECOMMENDATIONS_HEADER)) else {
        return Vec::new();
    };
    let Some(array) = METRICS_ARRAY.find(region) else {
        warn!("No JSON array found in the key metrics section");
        return Vec::new();
    };

    match serde_json::from_str::<Vec<KeyMetric>>(array.as_str()) {
        Ok(metrics) => metrics,
        Err(e) => {
            error!("Error parsing metrics JSON: {}", e);
            Vec::new()
        }
    }
}

pub fn extract_recommendations(response: &str) -> Option<Vec<String>> {
    let region = section(response, RECOMMENDATIONS_HEADER, Some(CHART_HEADER))?;

    let recommendations: Vec<String> = region
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            line.strip_prefix('-')
                .or_else(|| line.strip_prefix('•'))
        })
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if recommendations.is_empty() {
        None
    } else {
        Some(recommendations)
    }
}

pub fn extract_chart(response: &str) -> ChartConfig {
    let region = section(response, CHART_HEADER, None).unwrap_or(response);

    let Some(block) = FENCED_BLOCK.captures(region).and_then(|c| c.get(1)) else {
        warn!("No chart code found in the model response, using default chart");
        return ChartConfig::default_fallback();
    };

    match ChartConfig::parse(block.as_str()) {
        Ok(config) => config,
        Err(e) => {
            warn!("Chart code is not a usable chart configuration ({}), using fallback", e);
            ChartConfig::overview_fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Trend;

    const WELL_FORMED: &str = r#"
# Simplified Story
The bank grew its loans quickly, but more borrowers are falling behind on payments.

# Key Metrics
[
  {"name": "Loan Growth", "value": "18%", "trend": "positive", "significance": "Lending is expanding fast"},
  {"name": "Gross NPA", "value": "₹4,200 Cr", "trend": "negative", "significance": "Bad loans are rising"}
]

# Recommendations
- Watch the bad-loan ratio next quarter
• Compare provisioning with peers
Not a bullet, should be dropped

# Chart Code
```json
{
  "type": "bar",
  "data": {"labels": ["Loan Growth", "Gross NPA"], "datasets": [{"label": "Data", "data": [18, 4200]}]},
  "options": {"responsive": true, "maintainAspectRatio": false}
}
```
"#;

    #[test]
    fn test_well_formed_reply_fills_every_section() {
        let result = parse_analysis_response(WELL_FORMED);

        assert!(result.simplified_story.starts_with("The bank grew its loans quickly"));
        assert!(!result.simplified_story.contains("Key Metrics"));
        assert_eq!(result.key_metrics.len(), 2);
        assert_eq!(result.key_metrics[1].name, "Gross NPA");
        assert_eq!(result.key_metrics[1].trend, Trend::Negative);
        assert_eq!(
            result.recommendations,
            Some(vec![
                "Watch the bad-loan ratio next quarter".to_string(),
                "Compare provisioning with peers".to_string(),
            ])
        );
        let chart = result.chart_code.unwrap();
        assert!(chart.contains("Loan Growth"));
        assert!(!chart.contains("Financial Data Overview"));
    }

    #[test]
    fn test_missing_metrics_array_yields_empty_list() {
        let reply = "# Simplified Story\nAll fine.\n\n# Key Metrics\nRevenue went up a lot.\n\n# Recommendations\n- Keep going\n";
        let result = parse_analysis_response(reply);
        assert!(result.key_metrics.is_empty());
        assert_eq!(result.simplified_story, "All fine.");
        assert_eq!(result.recommendations, Some(vec!["Keep going".to_string()]));
    }

    #[test]
    fn test_malformed_metrics_array_yields_empty_list() {
        let reply = "# Key Metrics\n[{\"name\": \"Revenue\", \"value\": }]\n# Recommendations\n";
        assert!(extract_metrics(reply).is_empty());
    }

    #[test]
    fn test_null_fields_keep_the_rest_of_the_metrics() {
        let reply = r#"# Key Metrics
[
  {"name": "Revenue", "value": "₹120 Cr", "trend": "positive", "significance": "Sales grew"},
  {"name": "EBITDA", "value": 14.2, "trend": null, "significance": null}
]
# Recommendations
"#;
        let metrics = extract_metrics(reply);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].trend, Trend::Positive);
        assert_eq!(metrics[1].name, "EBITDA");
        assert_eq!(metrics[1].value, "14.2");
        assert_eq!(metrics[1].trend, Trend::Neutral);
        assert_eq!(metrics[1].significance, "");
    }

    #[test]
    fn test_chart_keeps_extra_top_level_keys() {
        let reply = "# Chart Code\n```json\n{\"type\":\"bar\",\"data\":{},\"options\":{},\"plugins\":[{\"id\":\"x\"}]}\n```";
        let code = parse_analysis_response(reply).chart_code.unwrap();
        let chart: serde_json::Value = serde_json::from_str(&code).unwrap();
        assert_eq!(chart["type"], "bar");
        assert_eq!(chart["plugins"][0]["id"], "x");
    }

    #[test]
    fn test_other_language_blocks_are_not_charts() {
        let reply = "# Chart Code\n```python\nprint('{}')\n```\n";
        let code = parse_analysis_response(reply).chart_code.unwrap();
        assert!(code.contains("Default Chart - No data available"));
    }

    #[test]
    fn test_chart_without_type_uses_overview_fallback() {
        let reply = "# Chart Code\n```json\n{\"data\": {\"labels\": [\"A\"]}}\n```\n";
        let code = parse_analysis_response(reply).chart_code.unwrap();
        assert!(code.contains(r#""type":"bar""#));
        assert!(code.contains("Financial Data Overview"));
    }

    #[test]
    fn test_missing_code_block_uses_default_chart() {
        let code = parse_analysis_response("# Simplified Story\nNothing to chart.")
            .chart_code
            .unwrap();
        assert!(code.contains("Default Chart - No data available"));
        assert!(!code.contains("Financial Data Overview"));
    }

    #[test]
    fn test_javascript_literal_chart_is_not_trusted() {
        let reply = "# Chart Code\n```javascript\n{ type: 'bar', data: {} };\n```";
        let code = parse_analysis_response(reply).chart_code.unwrap();
        assert!(code.contains("Financial Data Overview"));
    }

    #[test]
    fn test_chart_block_found_after_fenced_metrics() {
        let reply = "# Key Metrics\n```json\n[{\"name\": \"A\", \"value\": \"1\"}]\n```\n# Chart Code\n```json\n{\"type\": \"doughnut\"}\n```";
        let result = parse_analysis_response(reply);
        assert_eq!(result.key_metrics.len(), 1);
        assert_eq!(result.chart_code.as_deref(), Some(r#"{"type":"doughnut"}"#));
    }

    #[test]
    fn test_recommendations_strip_markers() {
        let reply = "# Recommendations\n  -   Diversify holdings  \n•Reduce leverage\n* star bullets are ignored\n-\n";
        assert_eq!(
            extract_recommendations(reply),
            Some(vec!["Diversify holdings".to_string(), "Reduce leverage".to_string()])
        );
    }

    #[test]
    fn test_no_bullets_means_no_recommendations() {
        assert_eq!(extract_recommendations("# Recommendations\nJust prose here."), None);
        assert_eq!(extract_recommendations("no headers at all"), None);
    }

    #[test]
    fn test_missing_story_is_empty() {
        assert_eq!(extract_story("# Key Metrics\n[]"), "");
    }
}
