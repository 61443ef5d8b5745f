//! Parsing of raw model output.

use serde::de::DeserializeOwned;
use venue_common::{DensityCluster, TacticalResponse};

/// Errors from interpreting model output.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("Response is missing required fields")]
    MissingFields,
    #[error("Count does not fit in range: {0}")]
    CountOutOfRange(String),
}

/// Return the body of the first markdown code fence, or the trimmed text.
///
/// Accepts fences with or without a `json` language tag. An unterminated
/// fence leaves the text unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    const FENCE: &str = "```";
    let Some(open) = text.find(FENCE) else {
        return text.trim();
    };
    let after_open = &text[open + FENCE.len()..];
    let Some(close) = after_open.find(FENCE) else {
        return text.trim();
    };
    let inner = &after_open[..close];
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    serde_json::from_str(strip_code_fence(text)).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

/// Parse a tactical response, rejecting empty required fields.
pub fn parse_tactical_response(text: &str) -> Result<TacticalResponse, ParseError> {
    let response: TacticalResponse = parse_json(text)?;
    if response.is_well_formed() {
        Ok(response)
    } else {
        Err(ParseError::MissingFields)
    }
}

/// Parse density clusters, clamping every value into range.
///
/// Accepts a bare array or an object with a `clusters` array.
pub fn parse_density_clusters(text: &str) -> Result<Vec<DensityCluster>, ParseError> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Clusters {
        Bare(Vec<DensityCluster>),
        Wrapped { clusters: Vec<DensityCluster> },
    }

    let clusters = match parse_json::<Clusters>(text)? {
        Clusters::Bare(clusters) | Clusters::Wrapped { clusters } => clusters,
    };
    Ok(clusters.into_iter().map(DensityCluster::clamped).collect())
}

/// Extract the first run of ASCII digits anywhere in the text.
///
/// No digits means zero people. A run too long for `u32` is an error rather
/// than a silently wrong count.
pub fn extract_count(text: &str) -> Result<u32, ParseError> {
    let Some(start) = text.find(|c: char| c.is_ascii_digit()) else {
        return Ok(0);
    };
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    digits
        .parse::<u32>()
        .map_err(|_| ParseError::CountOutOfRange(digits.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_count() {
        assert_eq!(extract_count("3"), Ok(3));
        assert_eq!(extract_count(" 12 people detected"), Ok(12));
        assert_eq!(extract_count("No people, 0"), Ok(0));
        assert_eq!(extract_count(""), Ok(0));
        assert_eq!(extract_count("abc"), Ok(0));
    }

    #[test]
    fn test_extract_count_takes_first_run_only() {
        assert_eq!(extract_count("about 40-45 people"), Ok(40));
        assert_eq!(extract_count("**7**"), Ok(7));
        assert_eq!(extract_count("007"), Ok(7));
    }

    #[test]
    fn test_extract_count_overflow() {
        assert!(matches!(
            extract_count("99999999999999999999"),
            Err(ParseError::CountOutOfRange(_))
        ));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("Here you go:\n```json {} ``` done"), "{}");
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json {\"a\""), "```json {\"a\"");
    }

    #[test]
    fn test_parse_fenced_tactical_response() {
        let text = "```json\n{\"priority\": \"Critical\", \"actions\": [\"Open gate 3\", \"Hold entry\"], \"riskAssessment\": \"Crush risk\"}\n```";
        let response = parse_tactical_response(text).unwrap();
        assert_eq!(response.priority, "Critical");
        assert_eq!(response.actions.len(), 2);
        assert!(response.suggested_route.is_none());
    }

    #[test]
    fn test_parse_truncated_tactical_response() {
        let text = r#"{"priority": "High", "actions": ["Dispatch"#;
        assert!(matches!(
            parse_tactical_response(text),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_tactical_response_missing_fields() {
        assert!(matches!(
            parse_tactical_response(r#"{"priority": "High", "actions": ["a"]}"#),
            Err(ParseError::InvalidJson(_))
        ));
        assert_eq!(
            parse_tactical_response(r#"{"priority": "", "actions": ["a"], "riskAssessment": "r"}"#),
            Err(ParseError::MissingFields)
        );
    }

    #[test]
    fn test_parse_density_clusters() {
        let bare = r#"[{"x": 10, "y": 20, "intensity": 0.9}, {"x": 150, "y": 5, "intensity": 2}]"#;
        let clusters = parse_density_clusters(bare).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[1].x, 100.0);
        assert_eq!(clusters[1].intensity, 1.0);

        let wrapped = "```json\n{\"clusters\": [{\"x\": 1, \"y\": 2, \"intensity\": 0.1}]}\n```";
        assert_eq!(parse_density_clusters(wrapped).unwrap().len(), 1);

        assert!(parse_density_clusters("not json").is_err());
    }
}
