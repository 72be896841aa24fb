//! Generation pipeline: configuration, per-category aggregation and the
//! run-level orchestrator.
//!
//! # Flow
//!
//! 1. **Seeds**: each category starts from its catalog seed records
//! 2. **Rounds**: batches are planned per backend share and chunk, split
//!    between forking and traditional by the forking ratio
//! 3. **Fan-out**: every batch of a round runs concurrently and is joined once
//! 4. **Validation**: candidates are validated per batch; rejections are logged
//!    and counted, never fatal
//! 5. **Retry**: short categories get another round with wider batches, up to
//!    the configured bound
//!
//! # Example
//!
//! ```rust,ignore
//! use forkgen::categories::CategoryCatalog;
//! use forkgen::llm::{OpenRouterProvider, RetryingBackend};
//! use forkgen::pipeline::{GenerationConfig, PipelineOrchestrator};
//! use std::sync::Arc;
//!
//! let config = GenerationConfig::from_env()?;
//! let backend = Arc::new(RetryingBackend::new(Arc::new(OpenRouterProvider::from_env()?)));
//! let mut orchestrator =
//!     PipelineOrchestrator::new(config, Arc::new(CategoryCatalog::standard()), backend)?;
//!
//! let run = orchestrator.run().await?;
//! println!("{} records, forking ratio {:.2}", run.total_records(), run.overall_forking_ratio());
//! ```

pub mod aggregator;
pub mod config;
pub mod orchestrator;

pub use aggregator::{CategoryAggregator, CategoryReport, CategoryStats};
pub use config::{BackendShare, ConfigError, GenerationConfig};
pub use orchestrator::{GenerationRun, PipelineError, PipelineOrchestrator};
