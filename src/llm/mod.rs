//! Backend adapter: chat-completion providers and the retrying text backend.
//!
//! - [`types`] - Wire types and the [`LlmProvider`] trait
//! - [`providers`] - [`OpenRouterProvider`], one HTTP attempt per call
//! - [`retry`] - Stateless [`RetryPolicy`] (attempt cap plus delay function)
//! - [`backend`] - [`TextBackend`] seam and [`RetryingBackend`]
//!
//! # Usage
//!
//! ```ignore
//! use forkgen::llm::{OpenRouterProvider, RetryingBackend, TextBackend};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(OpenRouterProvider::from_env()?);
//! let backend = RetryingBackend::new(provider);
//! let raw = backend.generate(&envelope, "openai/gpt-4.1").await?;
//! ```

pub mod backend;
pub mod providers;
pub mod retry;
pub mod types;

pub use backend::{BackendFailure, FailureKind, RetryingBackend, TextBackend};
pub use providers::OpenRouterProvider;
pub use retry::{is_transient_error, RetryPolicy};
pub use types::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, ResponseFormat, Usage,
};
