//! Validated prompt records and their persisted row form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::categories::Category;

/// Literal token marking a blank in a prompt.
pub const PLACEHOLDER: &str = "{}";

/// Counts the non-overlapping `{}` placeholders in `text`.
pub fn count_placeholders(text: &str) -> usize {
    text.matches(PLACEHOLDER).count()
}

// ============================================================================
// Metadata Types
// ============================================================================

/// Narrative perspective of a prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perspective {
    /// Told from the model's own viewpoint ("I ...").
    First,
    /// Addressed to the reader ("You ...").
    Second,
    /// About other people or entities.
    #[default]
    Third,
}

impl Perspective {
    /// Returns all perspectives in canonical order.
    pub fn all() -> [Perspective; 3] {
        [Perspective::First, Perspective::Second, Perspective::Third]
    }

    /// Returns the serialized name of this perspective.
    pub fn as_str(&self) -> &'static str {
        match self {
            Perspective::First => "first",
            Perspective::Second => "second",
            Perspective::Third => "third",
        }
    }

    /// Leniently parses a perspective label such as `"first"` or `"Second-person"`.
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.starts_with("first") || label == "1st" {
            Some(Perspective::First)
        } else if label.starts_with("second") || label == "2nd" {
            Some(Perspective::Second)
        } else if label.starts_with("third") || label == "3rd" {
            Some(Perspective::Third)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Perspective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-reported complexity of a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// Returns all complexity levels in ascending order.
    pub fn all() -> [Complexity; 3] {
        [Complexity::Low, Complexity::Medium, Complexity::High]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }

    /// Parses a complexity label, ignoring case and surrounding whitespace.
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(Complexity::Low),
            "medium" | "med" => Some(Complexity::Medium),
            "high" => Some(Complexity::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive bounds of the reasoning-depth scale.
pub const REASONING_DEPTH_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// The two prompt shapes a category produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    /// Single answer pair, one or two blanks.
    Traditional,
    /// Several blanks, one answer pair each, with a marked forking index.
    Forking,
}

impl VariantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantKind::Traditional => "traditional",
            VariantKind::Forking => "forking",
        }
    }
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Records
// ============================================================================

/// A correct continuation and its contrasting distractor.
///
/// Serialized as a two-element array `["correct", "distractor"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnswerPair(pub String, pub String);

impl AnswerPair {
    /// Create a new answer pair.
    pub fn new(correct: impl Into<String>, distractor: impl Into<String>) -> Self {
        Self(correct.into(), distractor.into())
    }

    /// The expected continuation.
    pub fn correct(&self) -> &str {
        &self.0
    }

    /// The contrasting continuation.
    pub fn distractor(&self) -> &str {
        &self.1
    }
}

/// Where a record came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordSource {
    /// Hand-written catalog seed.
    Seed,
    /// Produced by the named backend model.
    Model(String),
}

impl RecordSource {
    /// Label stored in the `model_used` column.
    pub fn label(&self) -> &str {
        match self {
            RecordSource::Seed => "seed",
            RecordSource::Model(model) => model,
        }
    }

    /// Inverse of [`RecordSource::label`].
    pub fn from_label(label: &str) -> Self {
        if label == "seed" {
            RecordSource::Seed
        } else {
            RecordSource::Model(label.to_string())
        }
    }
}

/// Variant-specific payload of a validated record.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptVariant {
    Traditional {
        answer: AnswerPair,
        distractors_present: bool,
    },
    Forking {
        /// One pair per placeholder, in order.
        placeholder_pairs: Vec<AnswerPair>,
        /// Position of the critical placeholder, always `< placeholder_pairs.len()`.
        forking_index: usize,
    },
}

impl PromptVariant {
    pub fn kind(&self) -> VariantKind {
        match self {
            PromptVariant::Traditional { .. } => VariantKind::Traditional,
            PromptVariant::Forking { .. } => VariantKind::Forking,
        }
    }
}

/// A prompt that satisfied every structural and semantic check for its category.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRecord {
    pub id: Uuid,
    pub category: Category,
    pub source: RecordSource,
    pub created_at: DateTime<Utc>,
    pub prompt: String,
    pub variant: PromptVariant,
    pub complexity: Option<Complexity>,
    pub reasoning_depth: Option<u8>,
    pub perspective: Perspective,
}

impl PromptRecord {
    pub fn is_forking(&self) -> bool {
        matches!(self.variant, PromptVariant::Forking { .. })
    }

    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.prompt)
    }

    /// The pair exported as `answer_true` / `answer_false`.
    ///
    /// Forking records mirror their last placeholder pair.
    pub fn legacy_answer(&self) -> Option<&AnswerPair> {
        match &self.variant {
            PromptVariant::Traditional { answer, .. } => Some(answer),
            PromptVariant::Forking {
                placeholder_pairs, ..
            } => placeholder_pairs.last(),
        }
    }

    /// Flattens the record into its persisted row shape.
    pub fn to_row(&self) -> RecordRow {
        let (answer_true, answer_false) = self
            .legacy_answer()
            .map(|pair| (pair.correct().to_string(), pair.distractor().to_string()))
            .unwrap_or_default();

        let (placeholder_pairs, forking_indices, distractors_present) = match &self.variant {
            PromptVariant::Traditional {
                distractors_present,
                ..
            } => (None, None, Some(*distractors_present)),
            PromptVariant::Forking {
                placeholder_pairs,
                forking_index,
            } => (
                Some(placeholder_pairs.clone()),
                Some(vec![*forking_index]),
                None,
            ),
        };

        RecordRow {
            id: self.id,
            category: self.category,
            model_used: self.source.label().to_string(),
            created_utc: self.created_at,
            prompt: self.prompt.clone(),
            answer_true,
            answer_false,
            placeholder_pairs,
            forking_indices,
            complexity: self.complexity,
            reasoning_depth: self.reasoning_depth,
            distractors_present,
            perspective: self.perspective,
            is_forking: self.is_forking(),
        }
    }
}

/// Flat row persisted under `_rows` in the dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: Uuid,
    pub category: Category,
    pub model_used: String,
    pub created_utc: DateTime<Utc>,
    pub prompt: String,
    pub answer_true: String,
    pub answer_false: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_pairs: Option<Vec<AnswerPair>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forking_indices: Option<Vec<usize>>,
    pub complexity: Option<Complexity>,
    pub reasoning_depth: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distractors_present: Option<bool>,
    pub perspective: Perspective,
    pub is_forking: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forking_record() -> PromptRecord {
        PromptRecord {
            id: Uuid::new_v4(),
            category: Category::Counterfactual,
            source: RecordSource::Model("openai/gpt-4.1".to_string()),
            created_at: Utc::now(),
            prompt: "If they had {} they would {} and avoid the {}.".to_string(),
            variant: PromptVariant::Forking {
                placeholder_pairs: vec![
                    AnswerPair::new("left early", "stayed late"),
                    AnswerPair::new("caught the train", "missed the train"),
                    AnswerPair::new("storm", "parade"),
                ],
                forking_index: 1,
            },
            complexity: Some(Complexity::Medium),
            reasoning_depth: Some(3),
            perspective: Perspective::Third,
        }
    }

    #[test]
    fn test_count_placeholders() {
        assert_eq!(count_placeholders("no blanks"), 0);
        assert_eq!(count_placeholders("one {} two {}"), 2);
        assert_eq!(count_placeholders("{}{}{}"), 3);
    }

    #[test]
    fn test_answer_pair_serializes_as_array() {
        let pair = AnswerPair::new("basket", "box");
        let json = serde_json::to_string(&pair).expect("serialize");
        assert_eq!(json, r#"["basket","box"]"#);
    }

    #[test]
    fn test_perspective_labels() {
        assert_eq!(Perspective::parse_label("First"), Some(Perspective::First));
        assert_eq!(
            Perspective::parse_label(" second-person "),
            Some(Perspective::Second)
        );
        assert_eq!(Perspective::parse_label("3rd"), Some(Perspective::Third));
        assert_eq!(Perspective::parse_label("omniscient"), None);
        assert_eq!(Perspective::default(), Perspective::Third);
    }

    #[test]
    fn test_complexity_labels() {
        assert_eq!(Complexity::parse_label("HIGH"), Some(Complexity::High));
        assert_eq!(Complexity::parse_label("extreme"), None);
    }

    #[test]
    fn test_forking_row_mirrors_last_pair() {
        let record = forking_record();
        let row = record.to_row();

        assert!(row.is_forking);
        assert_eq!(row.answer_true, "storm");
        assert_eq!(row.answer_false, "parade");
        assert_eq!(row.forking_indices, Some(vec![1]));
        assert_eq!(row.distractors_present, None);
        assert_eq!(row.model_used, "openai/gpt-4.1");
    }

    #[test]
    fn test_traditional_row_omits_forking_fields() {
        let mut record = forking_record();
        record.prompt = "The capital of Japan is {}.".to_string();
        record.variant = PromptVariant::Traditional {
            answer: AnswerPair::new("Tokyo", "Kyoto"),
            distractors_present: true,
        };
        record.source = RecordSource::Seed;

        let json = serde_json::to_value(record.to_row()).expect("serialize");
        assert!(json.get("placeholder_pairs").is_none());
        assert!(json.get("forking_indices").is_none());
        assert_eq!(json["distractors_present"], true);
        assert_eq!(json["model_used"], "seed");
        assert_eq!(json["is_forking"], false);
    }

    #[test]
    fn test_record_source_label_round_trip() {
        assert_eq!(RecordSource::from_label("seed"), RecordSource::Seed);
        assert_eq!(
            RecordSource::from_label("openai/gpt-4.5-preview").label(),
            "openai/gpt-4.5-preview"
        );
    }
}
