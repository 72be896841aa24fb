//! Command-line interface for forkgen.
//!
//! Provides dataset generation, catalog listing and re-validation of
//! written dataset files.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};
