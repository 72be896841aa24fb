//! Category catalog for forkgen.
//!
//! This module provides the fixed category taxonomy, each category's
//! structural contract, and the seed prompts every run starts from.

mod catalog;
mod seeds;
mod taxonomy;

pub use catalog::{
    CategoryCatalog, CategoryDefinition, ForkingSeed, DEFAULT_COMPLEXITY, DEFAULT_REASONING_DEPTH,
};
pub use taxonomy::{Category, PlaceholderRange, UnknownCategory};
