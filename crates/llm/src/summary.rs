//! Parsing of the model's structured scene summary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LlmError;

/// Summary sections requested by [`crate::prompts::SUMMARY_TEMPLATE`].
///
/// Models answer each section as a string or a list of strings, so the
/// values are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSummary {
    pub events: Value,
    pub character_dev: Value,
    pub details: Value,
    pub style: Value,
}

/// Parse a completion into a [`SceneSummary`].
///
/// Text around the outermost `{ ... }` is ignored (models like to wrap JSON
/// in a fenced code block or add a sentence before it).
pub fn parse_summary(completion: &str) -> Result<SceneSummary, LlmError> {
    let start = completion.find('{');
    let end = completion.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &completion[start..=end],
        _ => {
            return Err(LlmError::Decode(
                "summary is not a JSON object".to_string(),
            ))
        }
    };

    serde_json::from_str(json).map_err(|e| LlmError::Decode(format!("invalid summary: {e}")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_object_is_parsed() {
        let summary = parse_summary(
            r#"{"events": ["arriva", "parte"], "character_dev": "cresce", "details": [], "style": "asciutto"}"#,
        )
        .unwrap();

        assert_eq!(summary.events, json!(["arriva", "parte"]));
        assert_eq!(summary.style, json!("asciutto"));
    }

    #[test]
    fn fenced_block_with_preamble_is_parsed() {
        let completion = "Ecco il riassunto:\n```json\n{\"events\": [], \"character_dev\": \"\", \
                          \"details\": \"\", \"style\": \"\"}\n```";

        assert!(parse_summary(completion).is_ok());
    }

    #[test]
    fn missing_section_is_a_decode_error() {
        assert_matches!(
            parse_summary(r#"{"events": []}"#),
            Err(LlmError::Decode(msg)) if msg.contains("character_dev")
        );
    }

    #[test]
    fn prose_is_a_decode_error() {
        assert_matches!(parse_summary("Non posso farlo."), Err(LlmError::Decode(_)));
    }
}
