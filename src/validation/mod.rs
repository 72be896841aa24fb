//! Record validation and reconciliation.
//!
//! This module turns parsed [`CandidateRecord`](crate::parser::CandidateRecord)s
//! into typed [`PromptRecord`](crate::dataset::PromptRecord)s or rejection
//! diagnostics:
//!
//! - [`RecordValidator`] runs the traditional and forking sub-protocols
//! - [`RepairTable`] inserts missing theory-of-mind placeholders
//! - [`is_plausible`] applies the category vocabulary filters
//! - [`check_quality`] is the surface quality gate

pub mod lexicon;
mod outcome;
pub mod perspective;
pub mod quality;
pub mod repair;
mod validator;

pub use lexicon::is_plausible;
pub use outcome::{RejectReason, Rejection, ValidationOutcome};
pub use perspective::{detect_perspective, has_belief_phrase};
pub use quality::check_quality;
pub use repair::{AnchorKind, RepairFailure, RepairRule, RepairTable, REPAIR_RULES};
pub use validator::{check_placeholder_count, RecordValidator, ValidatorOptions};
