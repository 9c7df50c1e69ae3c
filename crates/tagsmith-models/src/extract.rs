//! Tolerant JSON extraction from model output.
//!
//! Vision models rarely return bare JSON: the payload is usually wrapped in
//! a fenced code block, prefixed with commentary, or both. This module digs
//! the outermost JSON object out of whatever text the model produced.

use tagsmith_abstraction::{ModelError, Record};

/// Extracts a structured record from raw model output.
///
/// Tries, in order: a ```` ```json ```` fenced block, a generic fenced
/// block, then the raw text. Within the chosen text, scans for the
/// outermost `{...}` or `[...]` span and parses it. A top-level array is
/// rejected since a record must be a key/value object.
///
/// # Errors
/// Returns a `ModelError::SerializationError` describing what was missing
/// or malformed.
pub fn extract_record(text: &str) -> Result<Record, ModelError> {
    if text.trim().is_empty() {
        return Err(ModelError::SerializationError("model returned no text".to_string()));
    }

    let candidate = fenced_block(text, "```json").or_else(|| fenced_block(text, "```")).unwrap_or(text);
    let candidate = candidate.trim();

    let start = candidate
        .find(['{', '['])
        .ok_or_else(|| ModelError::SerializationError("no JSON found in model output".to_string()))?;
    let partial = &candidate[start..];
    let end = partial
        .rfind(['}', ']'])
        .ok_or_else(|| ModelError::SerializationError("incomplete JSON structure".to_string()))?;

    let value: serde_json::Value = serde_json::from_str(&partial[..=end])
        .map_err(|e| ModelError::SerializationError(format!("JSON parse failed: {}", e)))?;

    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(ModelError::SerializationError(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Returns the content of the first fenced block opened by `fence`, if any.
fn fenced_block<'a>(text: &'a str, fence: &str) -> Option<&'a str> {
    let after_open = &text[text.find(fence)? + fence.len()..];
    let close = after_open.find("```")?;
    Some(&after_open[..close])
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bare_object() {
        let record = extract_record(r#"{"title": "sunset", "tags": ["sky"]}"#).unwrap();
        assert_eq!(record.get("title").unwrap(), "sunset");
    }

    #[test]
    fn test_extract_json_fence() {
        let text = "Here you go:\n```json\n{\"title\": \"boat\"}\n```\nHope that helps!";
        let record = extract_record(text).unwrap();
        assert_eq!(record.get("title").unwrap(), "boat");
    }

    #[test]
    fn test_extract_generic_fence() {
        let text = "```\n{\"title\": \"tree\"}\n```";
        let record = extract_record(text).unwrap();
        assert_eq!(record.get("title").unwrap(), "tree");
    }

    #[test]
    fn test_extract_with_leading_prose() {
        let text = "Sure! The metadata is {\"color\": \"red\"} as requested.";
        let record = extract_record(text).unwrap();
        assert_eq!(record.get("color").unwrap(), "red");
    }

    #[test]
    fn test_extract_rejects_array_root() {
        let err = extract_record("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ModelError::SerializationError(msg) if msg.contains("array")));
    }

    #[test]
    fn test_extract_empty_text() {
        assert!(extract_record("   ").is_err());
    }

    #[test]
    fn test_extract_no_json() {
        let err = extract_record("I cannot analyze this image.").unwrap_err();
        assert!(matches!(err, ModelError::SerializationError(msg) if msg.contains("no JSON")));
    }

    #[test]
    fn test_extract_malformed_json() {
        let err = extract_record("{\"title\": }").unwrap_err();
        assert!(matches!(err, ModelError::SerializationError(msg) if msg.contains("parse failed")));
    }

    #[test]
    fn test_extract_nested_braces() {
        let text = r#"{"outer": {"inner": "value"}, "n": 1}"#;
        let record = extract_record(text).unwrap();
        assert!(record.get("outer").unwrap().is_object());
    }
}
