//! Dataset record types.
//!
//! A [`PromptRecord`] is the only shape that leaves the validator. It is
//! flattened into a [`RecordRow`] when the dataset file is written.

mod record;

pub use record::{
    count_placeholders, AnswerPair, Complexity, Perspective, PromptRecord, PromptVariant,
    RecordRow, RecordSource, VariantKind, PLACEHOLDER, REASONING_DEPTH_RANGE,
};
