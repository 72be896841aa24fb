//! Response parsing: raw backend text to candidate records.
//!
//! The parser never fails a batch as a whole on a single bad item. It
//! locates the outermost JSON value in the response, normalizes the common
//! envelope shapes into a flat item list, and converts each item into a
//! [`CandidateRecord`]. Items that are not objects are skipped.

mod candidate;
mod plain_text;

pub use candidate::{CandidateRecord, FieldValue};
pub use plain_text::parse_plain_text;

use serde_json::Value;
use thiserror::Error;

use crate::utils::json_extraction::{extract_outermost_json, JsonExtractionResult};

/// Keys under which backends wrap their item list.
const ENVELOPE_KEYS: [&str; 3] = ["results", "data", "items"];

/// Errors that make a whole response unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("No JSON found in response")]
    NoJson,

    #[error("JSON truncated with {unclosed_braces} unclosed braces and {unclosed_brackets} unclosed brackets")]
    Truncated {
        unclosed_braces: usize,
        unclosed_brackets: usize,
    },

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Unexpected JSON structure with keys [{}]", .0.join(", "))]
    UnexpectedShape(Vec<String>),
}

/// Parses a backend response into candidate records.
///
/// # Arguments
///
/// * `raw` - Response text, possibly wrapped in prose or code fences
///
/// # Returns
///
/// The candidates in response order. An empty list is a valid result (for
/// example `{"results": []}`).
pub fn parse_response(raw: &str) -> Result<Vec<CandidateRecord>, ParseError> {
    let json = match extract_outermost_json(raw) {
        JsonExtractionResult::Success(json) => json,
        JsonExtractionResult::Truncated {
            unclosed_braces,
            unclosed_brackets,
            ..
        } => {
            return Err(ParseError::Truncated {
                unclosed_braces,
                unclosed_brackets,
            })
        }
        JsonExtractionResult::NotFound => return Err(ParseError::NoJson),
    };

    let payload: Value =
        serde_json::from_str(&json).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let items = normalize_payload(payload)?;
    let total = items.len();
    let candidates: Vec<CandidateRecord> =
        items.iter().filter_map(CandidateRecord::from_value).collect();

    if candidates.len() < total {
        tracing::debug!(
            skipped = total - candidates.len(),
            "Skipped non-object items in response"
        );
    }

    Ok(candidates)
}

/// Flattens the accepted envelope shapes into a list of items.
///
/// Accepts a bare array, an object wrapping an array under one of the
/// envelope keys, or a single bare object carrying a `prompt` key.
fn normalize_payload(payload: Value) -> Result<Vec<Value>, ParseError> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => {
            for key in ENVELOPE_KEYS {
                if let Some(Value::Array(items)) = obj.remove(key) {
                    return Ok(items);
                }
            }
            if obj.contains_key("prompt") {
                return Ok(vec![Value::Object(obj)]);
            }
            Err(ParseError::UnexpectedShape(obj.keys().cloned().collect()))
        }
        other => Err(ParseError::UnexpectedShape(vec![format!(
            "<{}>",
            match other {
                Value::String(_) => "string",
                Value::Number(_) => "number",
                Value::Bool(_) => "boolean",
                _ => "null",
            }
        )])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_envelope() {
        let raw = r#"{"results": [
            {"prompt": "The capital of Spain is {}.", "name_pair": ["Madrid", "Seville"]},
            {"prompt": "The largest ocean is the {}.", "name_pair": ["Pacific", "Atlantic"]}
        ]}"#;
        let candidates = parse_response(raw).expect("parse");
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[1].prompt.as_deref(),
            Some("The largest ocean is the {}.")
        );
    }

    #[test]
    fn test_data_and_items_envelopes() {
        for key in ["data", "items"] {
            let raw = format!(r#"{{"{}": [{{"prompt": "p {{}}"}}]}}"#, key);
            assert_eq!(parse_response(&raw).expect("parse").len(), 1);
        }
    }

    #[test]
    fn test_bare_array_in_fence() {
        let raw = "Here they are:\n```json\n[{\"prompt\": \"a {}\"}, {\"prompt\": \"b {}\"}]\n```";
        assert_eq!(parse_response(raw).expect("parse").len(), 2);
    }

    #[test]
    fn test_placeholder_in_leading_prose() {
        let raw = "Each prompt uses {} as the blank. Here you go:\n\
                   {\"results\": [{\"prompt\": \"The capital of Spain is {}.\", \
                   \"name_pair\": [\"Madrid\", \"Seville\"]}]}";
        let candidates = parse_response(raw).expect("parse");
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].prompt.as_deref(),
            Some("The capital of Spain is {}.")
        );
    }

    #[test]
    fn test_unknown_envelope_key_rejected() {
        let err = parse_response(r#"{"array": [{"prompt": "p {}"}]}"#).unwrap_err();
        assert_eq!(err, ParseError::UnexpectedShape(vec!["array".to_string()]));
    }

    #[test]
    fn test_single_bare_object() {
        let raw = r#"{"prompt": "Only one {}", "name_pair": ["x", "y"]}"#;
        let candidates = parse_response(raw).expect("parse");
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_unexpected_shape() {
        let err = parse_response(r#"{"foo": 1, "bar": 2}"#).unwrap_err();
        match err {
            ParseError::UnexpectedShape(keys) => {
                assert!(keys.contains(&"foo".to_string()));
                assert!(keys.contains(&"bar".to_string()));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_no_json() {
        assert_eq!(
            parse_response("I'm sorry, I can't do that."),
            Err(ParseError::NoJson)
        );
    }

    #[test]
    fn test_truncated() {
        let err = parse_response(r#"{"results": [{"prompt": "half"#).unwrap_err();
        assert!(matches!(err, ParseError::Truncated { .. }));
    }

    #[test]
    fn test_non_object_items_are_dropped() {
        let raw = r#"{"results": ["stray string", {"prompt": "kept {}"}, 42]}"#;
        let candidates = parse_response(raw).expect("parse");
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_empty_results_is_ok() {
        assert!(parse_response(r#"{"results": []}"#)
            .expect("parse")
            .is_empty());
    }
}
