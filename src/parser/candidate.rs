//! Typed view over one untrusted backend item.

use serde_json::{Map, Value};

use crate::dataset::AnswerPair;

/// State of an optional structured field in backend output.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    /// Key absent or `null`.
    Missing,
    /// Key present but the value has the wrong shape.
    Malformed(String),
    Present(T),
}

impl<T> Default for FieldValue<T> {
    fn default() -> Self {
        FieldValue::Missing
    }
}

impl<T> FieldValue<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, FieldValue::Present(_))
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            FieldValue::Present(value) => Some(value),
            _ => None,
        }
    }
}

/// An unvalidated record as returned by a backend.
///
/// Every field is optional; lenient conversions (numeric strings, integral
/// floats) happen here so the validator only sees typed values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateRecord {
    pub prompt: Option<String>,
    /// Traditional answer pair (`name_pair`, or `answer_true`/`answer_false`).
    pub name_pair: FieldValue<AnswerPair>,
    /// Forking per-placeholder pairs.
    pub placeholder_pairs: FieldValue<Vec<AnswerPair>>,
    /// Explicit `forking_index`.
    pub forking_index: Option<i64>,
    /// First element of `forking_indices`.
    pub first_listed_index: Option<i64>,
    pub complexity: Option<String>,
    pub reasoning_depth: Option<i64>,
    pub distractors_present: Option<bool>,
    pub perspective: Option<String>,
}

impl CandidateRecord {
    /// Convenience constructor for a traditional candidate.
    pub fn traditional(prompt: impl Into<String>, answer: AnswerPair) -> Self {
        Self {
            prompt: Some(prompt.into()),
            name_pair: FieldValue::Present(answer),
            ..Self::default()
        }
    }

    /// Convenience constructor for a forking candidate.
    pub fn forking(prompt: impl Into<String>, pairs: Vec<AnswerPair>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            placeholder_pairs: FieldValue::Present(pairs),
            ..Self::default()
        }
    }

    pub fn with_forking_index(mut self, index: i64) -> Self {
        self.forking_index = Some(index);
        self
    }

    /// Reads a candidate from one JSON item.
    ///
    /// Returns `None` when the item is not a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        Some(Self {
            prompt: obj
                .get("prompt")
                .and_then(Value::as_str)
                .filter(|p| !p.trim().is_empty())
                .map(str::to_string),
            name_pair: read_name_pair(obj),
            placeholder_pairs: read_placeholder_pairs(obj.get("placeholder_pairs")),
            forking_index: obj.get("forking_index").and_then(as_integer),
            first_listed_index: obj
                .get("forking_indices")
                .and_then(Value::as_array)
                .and_then(|indices| indices.first())
                .and_then(as_integer),
            complexity: obj
                .get("complexity")
                .and_then(Value::as_str)
                .map(str::to_string),
            reasoning_depth: obj.get("reasoning_depth").and_then(as_integer),
            distractors_present: obj.get("distractors_present").and_then(as_flag),
            perspective: obj
                .get("perspective")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Integer, integral float, or numeric string.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Reads an array of at least two strings, keeping the first two.
fn as_pair(value: &Value) -> Result<AnswerPair, String> {
    let items = value
        .as_array()
        .ok_or_else(|| format!("expected an array, got {}", type_name(value)))?;
    if items.len() < 2 {
        return Err(format!("expected two entries, got {}", items.len()));
    }
    match (items[0].as_str(), items[1].as_str()) {
        (Some(correct), Some(distractor)) => Ok(AnswerPair::new(correct, distractor)),
        _ => Err("pair entries must be strings".to_string()),
    }
}

fn read_name_pair(obj: &Map<String, Value>) -> FieldValue<AnswerPair> {
    match obj.get("name_pair") {
        Some(Value::Null) | None => {}
        Some(value) => {
            return match value.as_array().map(Vec::len) {
                Some(2) => as_pair(value)
                    .map(FieldValue::Present)
                    .unwrap_or_else(FieldValue::Malformed),
                Some(len) => FieldValue::Malformed(format!("expected two entries, got {}", len)),
                None => FieldValue::Malformed(format!(
                    "expected an array, got {}",
                    type_name(value)
                )),
            };
        }
    }

    // Persisted rows carry the pair as separate columns.
    match (
        obj.get("answer_true").and_then(Value::as_str),
        obj.get("answer_false").and_then(Value::as_str),
    ) {
        (Some(correct), Some(distractor)) => {
            FieldValue::Present(AnswerPair::new(correct, distractor))
        }
        _ => FieldValue::Missing,
    }
}

fn read_placeholder_pairs(value: Option<&Value>) -> FieldValue<Vec<AnswerPair>> {
    let value = match value {
        None | Some(Value::Null) => return FieldValue::Missing,
        Some(value) => value,
    };

    let Some(items) = value.as_array() else {
        return FieldValue::Malformed(format!("expected an array, got {}", type_name(value)));
    };

    let mut pairs = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match as_pair(item) {
            Ok(pair) => pairs.push(pair),
            Err(reason) => return FieldValue::Malformed(format!("pair {}: {}", index, reason)),
        }
    }
    FieldValue::Present(pairs)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
