//! Parser for the plain-text fallback format.
//!
//! When structured output keeps failing, backends are asked for records as
//! labelled lines:
//!
//! ```text
//! PROMPT: ...
//! CORRECT: ...
//! DISTRACTOR: ...
//! COMPLEXITY: low|medium|high
//! REASONING_DEPTH: 1-5
//! DISTRACTORS_PRESENT: true|false
//! ```
//!
//! Each `PROMPT:` line starts a new record.

use super::candidate::{CandidateRecord, FieldValue};
use crate::dataset::AnswerPair;

#[derive(Default)]
struct PendingRecord {
    prompt: Option<String>,
    correct: Option<String>,
    distractor: Option<String>,
    complexity: Option<String>,
    reasoning_depth: Option<i64>,
    distractors_present: Option<bool>,
    perspective: Option<String>,
}

impl PendingRecord {
    fn finish(self) -> Option<CandidateRecord> {
        let prompt = self.prompt?;
        let name_pair = match (self.correct, self.distractor) {
            (Some(correct), Some(distractor)) => {
                FieldValue::Present(AnswerPair::new(correct, distractor))
            }
            (None, None) => FieldValue::Missing,
            _ => FieldValue::Malformed("both CORRECT and DISTRACTOR are required".to_string()),
        };

        Some(CandidateRecord {
            prompt: Some(prompt),
            name_pair,
            complexity: self.complexity,
            reasoning_depth: self.reasoning_depth,
            distractors_present: self.distractors_present,
            perspective: self.perspective,
            ..CandidateRecord::default()
        })
    }
}

/// Splits `line` into an upper-cased label and its trimmed value.
fn split_label(line: &str) -> Option<(String, &str)> {
    let line = line
        .trim()
        .trim_start_matches(|c: char| c == '-' || c == '*' || c.is_ascii_digit() || c == '.')
        .trim_start();
    let (label, value) = line.split_once(':')?;
    let label = label.trim().trim_matches('*').trim().replace(' ', "_").to_uppercase();
    Some((label, value.trim()))
}

/// Parses labelled plain-text records.
///
/// Unknown labels and unlabelled lines are ignored. Records without a
/// non-empty prompt are dropped.
pub fn parse_plain_text(raw: &str) -> Vec<CandidateRecord> {
    let mut records = Vec::new();
    let mut pending: Option<PendingRecord> = None;

    for line in raw.lines() {
        let Some((label, value)) = split_label(line) else {
            continue;
        };

        if label == "PROMPT" {
            if let Some(done) = pending.take().and_then(PendingRecord::finish) {
                records.push(done);
            }
            pending = Some(PendingRecord {
                prompt: Some(value.to_string()).filter(|p| !p.is_empty()),
                ..PendingRecord::default()
            });
            continue;
        }

        let Some(current) = pending.as_mut() else {
            continue;
        };

        match label.as_str() {
            "CORRECT" => current.correct = Some(value.to_string()),
            "DISTRACTOR" => current.distractor = Some(value.to_string()),
            "COMPLEXITY" => current.complexity = Some(value.to_lowercase()),
            "REASONING_DEPTH" => current.reasoning_depth = value.parse().ok(),
            "DISTRACTORS_PRESENT" => {
                current.distractors_present =
                    Some(matches!(value.to_lowercase().as_str(), "true" | "yes" | "1"))
            }
            "PERSPECTIVE" => current.perspective = Some(value.to_lowercase()),
            _ => {}
        }
    }

    if let Some(done) = pending.and_then(PendingRecord::finish) {
        records.push(done);
    }

    records
}
