//! Shared utility functions for forkgen.
//!
//! This module provides common utilities used across multiple modules,
//! including JSON extraction from backend responses.

pub mod json_extraction;

pub use json_extraction::{
    analyze_json_structure, extract_from_code_block, extract_outermost_json,
    find_matching_brace, find_matching_bracket, JsonExtractionResult, JsonStructureAnalysis,
};
