//! forkgen: synthetic forking-token prompt dataset generator.
//!
//! Prompts are fill-in-the-blank sentences whose `{}` blanks each carry a
//! correct continuation and a contrasting distractor. This library asks LLM
//! backends for such prompts across seven cognitive categories, validates
//! and repairs what comes back, and writes one JSON dataset per run.

pub mod categories;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod export;
pub mod llm;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod utils;
pub mod validation;

// Re-export commonly used error types
pub use error::{ExportError, LlmError, ValidatorError};
