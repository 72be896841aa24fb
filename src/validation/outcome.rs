//! Validation outcomes and rejection diagnostics.

use thiserror::Error;

use super::repair::RepairFailure;
use crate::categories::{Category, PlaceholderRange};
use crate::dataset::{Perspective, PromptRecord, VariantKind};

/// One reason a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("category '{0}' is not in the catalog")]
    NotInCatalog(Category),

    #[error("missing prompt")]
    MissingPrompt,

    #[error("missing name_pair")]
    MissingAnswerPair,

    #[error("malformed name_pair: {0}")]
    MalformedAnswerPair(String),

    #[error("missing placeholder_pairs")]
    MissingPlaceholderPairs,

    #[error("malformed placeholder_pairs: {0}")]
    MalformedPlaceholderPairs(String),

    #[error("no {perspective}-person belief phrase")]
    NoBeliefPhrase { perspective: Perspective },

    #[error("placeholder repair failed: {0}")]
    RepairFailed(RepairFailure),

    #[error("no placeholders")]
    NoPlaceholders,

    #[error("{count} placeholders, expected {range}")]
    PlaceholderCountOutOfRange {
        count: usize,
        range: PlaceholderRange,
    },

    #[error("{placeholders} placeholders but {pairs} placeholder pairs")]
    PairCountMismatch { placeholders: usize, pairs: usize },

    #[error("lacks the vocabulary expected for {category}")]
    Implausible { category: Category },

    #[error("{words} words, minimum is {min}")]
    TooShort { words: usize, min: usize },

    #[error("does not end with an accepted terminal character")]
    BadTerminal,

    #[error("{count} ellipses")]
    TooManyEllipses { count: usize },
}

/// Diagnostic for a dropped candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub category: Category,
    pub variant: VariantKind,
    pub prompt: Option<String>,
    /// Never empty.
    pub reasons: Vec<RejectReason>,
}

impl Rejection {
    pub fn has_reason(&self, predicate: impl Fn(&RejectReason) -> bool) -> bool {
        self.reasons.iter().any(predicate)
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} rejected: ", self.category, self.variant)?;
        for (i, reason) in self.reasons.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", reason)?;
        }
        Ok(())
    }
}

/// Result of validating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Accepted(PromptRecord),
    Rejected(Rejection),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }

    pub fn accepted(self) -> Option<PromptRecord> {
        match self {
            ValidationOutcome::Accepted(record) => Some(record),
            ValidationOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ValidationOutcome::Accepted(_) => None,
            ValidationOutcome::Rejected(rejection) => Some(rejection),
        }
    }
}
