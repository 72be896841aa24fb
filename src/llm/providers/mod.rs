//! LLM provider implementations.

pub mod openrouter;

pub use openrouter::{OpenRouterProvider, OpenRouterSettings, API_KEY_ENV, OPENROUTER_BASE_URL};

pub use super::types::LlmProvider;
