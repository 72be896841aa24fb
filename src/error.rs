//! Error types for forkgen operations.
//!
//! Defines error types for the subsystems that can fail in a way the caller
//! has to handle:
//! - Backend (LLM API) interactions
//! - Dataset export to the filesystem
//! - Validator construction

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: OPENROUTER_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },
}

/// Errors that can occur while writing or reading a dataset file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Output directory '{path}' is not usable: {reason}")]
    OutputDirectory { path: String, reason: String },

    #[error("Failed to persist dataset to '{path}': {reason}")]
    PersistFailed { path: String, reason: String },

    #[error("Invalid dataset file: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while building a record validator.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("Invalid repair pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
