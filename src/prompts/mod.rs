//! Generation request construction.
//!
//! - [`system`] - System messages for traditional, forking and plain-text requests
//! - [`builder`] - [`RequestEnvelope`] construction from a category definition
//!
//! # Usage
//!
//! ```
//! use forkgen::categories::{Category, CategoryCatalog};
//! use forkgen::dataset::VariantKind;
//! use forkgen::prompts::build_request;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let catalog = CategoryCatalog::standard();
//! let definition = catalog.get(Category::Counterfactual).expect("standard category");
//! let mut rng = ChaCha8Rng::seed_from_u64(1);
//!
//! let envelope = build_request(definition, VariantKind::Forking, 4, "openai/gpt-4.1", &mut rng);
//! assert!(envelope.json_output);
//! assert!(envelope.user.contains("EXACTLY 3 placeholders"));
//! ```

pub mod builder;
mod guidance;
pub mod system;

pub use builder::{
    build_plain_text_fallback, build_request, RequestEnvelope, FORKING_TEMPERATURE,
    MIN_MAX_TOKENS, TRADITIONAL_TEMPERATURE,
};
pub use system::{forking_system, PLAIN_TEXT_SYSTEM, TRADITIONAL_SYSTEM};
