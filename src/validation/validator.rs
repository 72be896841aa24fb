//! The record validator: untrusted candidates in, typed records out.
//!
//! Each candidate goes through the sub-protocol for its variant. Structural
//! failures (missing prompt, malformed pairs, failed repair) reject
//! immediately. The placeholder-range, plausibility and quality checks run
//! together so a rejection lists every reason at once.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::lexicon::is_plausible;
use super::outcome::{RejectReason, Rejection, ValidationOutcome};
use super::perspective::{detect_perspective, has_belief_phrase};
use super::quality::check_quality;
use super::repair::RepairTable;
use crate::categories::{
    Category, CategoryCatalog, CategoryDefinition, PlaceholderRange, DEFAULT_COMPLEXITY,
    DEFAULT_REASONING_DEPTH,
};
use crate::dataset::{
    count_placeholders, AnswerPair, Complexity, Perspective, PromptRecord, PromptVariant,
    RecordSource, VariantKind, REASONING_DEPTH_RANGE,
};
use crate::error::ValidatorError;
use crate::parser::{CandidateRecord, FieldValue};

/// Validator switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Apply the word-count / terminal / ellipsis gate to traditional prompts.
    pub quality_gate: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self { quality_gate: true }
    }
}

/// Stateless validator shared by every batch of a run.
#[derive(Debug)]
pub struct RecordValidator {
    catalog: Arc<CategoryCatalog>,
    repair: RepairTable,
    options: ValidatorOptions,
}

/// Checks that `count` placeholders fit `range`.
///
/// Zero placeholders is always rejected. A count outside the range passes
/// only when it equals `expected`.
pub fn check_placeholder_count(
    count: usize,
    range: PlaceholderRange,
    expected: Option<usize>,
) -> Result<(), RejectReason> {
    if count == 0 {
        return Err(RejectReason::NoPlaceholders);
    }
    if range.contains(count) || expected == Some(count) {
        Ok(())
    } else {
        Err(RejectReason::PlaceholderCountOutOfRange { count, range })
    }
}

impl RecordValidator {
    /// Creates a validator with default options.
    pub fn new(catalog: Arc<CategoryCatalog>) -> Result<Self, ValidatorError> {
        Ok(Self {
            catalog,
            repair: RepairTable::compile()?,
            options: ValidatorOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_quality_gate(mut self, enabled: bool) -> Self {
        self.options.quality_gate = enabled;
        self
    }

    pub fn options(&self) -> ValidatorOptions {
        self.options
    }

    /// Validates one candidate.
    ///
    /// # Arguments
    ///
    /// * `category` - Category the candidate was requested for
    /// * `variant` - Which sub-protocol to run
    /// * `candidate` - Parsed backend item
    /// * `source` - Backend that produced it, stamped on the record
    pub fn validate(
        &self,
        category: Category,
        variant: VariantKind,
        candidate: &CandidateRecord,
        source: RecordSource,
    ) -> ValidationOutcome {
        let Some(definition) = self.catalog.get(category) else {
            return reject(
                category,
                variant,
                candidate,
                vec![RejectReason::NotInCatalog(category)],
            );
        };

        let result = match variant {
            VariantKind::Traditional => self.validate_traditional(definition, candidate, source),
            VariantKind::Forking => self.validate_forking(definition, candidate, source),
        };

        match result {
            Ok(record) => ValidationOutcome::Accepted(record),
            Err(reasons) => reject(category, variant, candidate, reasons),
        }
    }

    fn validate_traditional(
        &self,
        definition: &CategoryDefinition,
        candidate: &CandidateRecord,
        source: RecordSource,
    ) -> Result<PromptRecord, Vec<RejectReason>> {
        let category = definition.category;
        let prompt = candidate
            .prompt
            .as_deref()
            .ok_or_else(|| vec![RejectReason::MissingPrompt])?;
        let answer = match &candidate.name_pair {
            FieldValue::Present(pair) => pair.clone(),
            FieldValue::Missing => return Err(vec![RejectReason::MissingAnswerPair]),
            FieldValue::Malformed(why) => {
                return Err(vec![RejectReason::MalformedAnswerPair(why.clone())])
            }
        };

        let mut prompt = prompt.to_string();
        let mut detected = None;
        let mut lexicon_check = true;

        if category == Category::TheoryOfMind && count_placeholders(&prompt) != 2 {
            let perspective = detect_perspective(&prompt);
            if !has_belief_phrase(&prompt, perspective) {
                return Err(vec![RejectReason::NoBeliefPhrase { perspective }]);
            }
            prompt = self
                .repair
                .repair(&prompt, perspective)
                .map_err(|failure| vec![RejectReason::RepairFailed(failure)])?;
            detected = Some(perspective);
            lexicon_check = false;
        }

        let mut reasons = Vec::new();

        if let Err(reason) = check_placeholder_count(
            count_placeholders(&prompt),
            definition.traditional_range,
            None,
        ) {
            reasons.push(reason);
        }

        if lexicon_check && !is_plausible(category, &prompt) {
            reasons.push(RejectReason::Implausible { category });
        }

        if self.options.quality_gate {
            reasons.extend(check_quality(&prompt, definition.min_words));
        }

        if !reasons.is_empty() {
            return Err(reasons);
        }

        let perspective = candidate
            .perspective
            .as_deref()
            .and_then(Perspective::parse_label)
            .or(detected)
            .unwrap_or_default();

        Ok(PromptRecord {
            id: Uuid::new_v4(),
            category,
            source,
            created_at: Utc::now(),
            prompt,
            variant: PromptVariant::Traditional {
                answer,
                distractors_present: candidate.distractors_present.unwrap_or(false),
            },
            complexity: parse_complexity(candidate),
            reasoning_depth: parse_depth(candidate),
            perspective,
        })
    }

    fn validate_forking(
        &self,
        definition: &CategoryDefinition,
        candidate: &CandidateRecord,
        source: RecordSource,
    ) -> Result<PromptRecord, Vec<RejectReason>> {
        let category = definition.category;
        let prompt = candidate
            .prompt
            .as_deref()
            .ok_or_else(|| vec![RejectReason::MissingPrompt])?;
        let mut pairs: Vec<AnswerPair> = match &candidate.placeholder_pairs {
            FieldValue::Present(pairs) => pairs.clone(),
            FieldValue::Missing => return Err(vec![RejectReason::MissingPlaceholderPairs]),
            FieldValue::Malformed(why) => {
                return Err(vec![RejectReason::MalformedPlaceholderPairs(why.clone())])
            }
        };

        let count = count_placeholders(prompt);
        if count != pairs.len() {
            let truncatable = category == Category::TheoryOfMind
                && count >= 2
                && pairs.len() > count;
            if truncatable {
                tracing::debug!(
                    category = %category,
                    placeholders = count,
                    pairs = pairs.len(),
                    "Truncating surplus placeholder pairs"
                );
                pairs.truncate(count);
            } else {
                return Err(vec![RejectReason::PairCountMismatch {
                    placeholders: count,
                    pairs: pairs.len(),
                }]);
            }
        }

        let mut reasons = Vec::new();
        if let Err(reason) = check_placeholder_count(count, definition.forking_range, Some(count))
        {
            reasons.push(reason);
        }
        if !is_plausible(category, prompt) {
            reasons.push(RejectReason::Implausible { category });
        }
        if !reasons.is_empty() {
            return Err(reasons);
        }

        let forking_index = candidate
            .forking_index
            .or(candidate.first_listed_index)
            .and_then(|index| usize::try_from(index).ok())
            .filter(|index| *index < count)
            .unwrap_or_else(|| category.default_forking_index(count));

        Ok(PromptRecord {
            id: Uuid::new_v4(),
            category,
            source,
            created_at: Utc::now(),
            prompt: prompt.to_string(),
            variant: PromptVariant::Forking {
                placeholder_pairs: pairs,
                forking_index,
            },
            complexity: Some(parse_complexity(candidate).unwrap_or(DEFAULT_COMPLEXITY)),
            reasoning_depth: Some(parse_depth(candidate).unwrap_or(DEFAULT_REASONING_DEPTH)),
            perspective: candidate
                .perspective
                .as_deref()
                .and_then(Perspective::parse_label)
                .unwrap_or_default(),
        })
    }
}

fn parse_complexity(candidate: &CandidateRecord) -> Option<Complexity> {
    candidate
        .complexity
        .as_deref()
        .and_then(Complexity::parse_label)
}

fn parse_depth(candidate: &CandidateRecord) -> Option<u8> {
    candidate
        .reasoning_depth
        .and_then(|depth| u8::try_from(depth).ok())
        .filter(|depth| REASONING_DEPTH_RANGE.contains(depth))
}

fn reject(
    category: Category,
    variant: VariantKind,
    candidate: &CandidateRecord,
    reasons: Vec<RejectReason>,
) -> ValidationOutcome {
    ValidationOutcome::Rejected(Rejection {
        category,
        variant,
        prompt: candidate.prompt.clone(),
        reasons,
    })
}
