//! Run-level orchestration across categories.
//!
//! Categories are processed one after another; concurrency happens inside
//! each category's rounds. The orchestrator never writes anything. It
//! returns a [`GenerationRun`] that the exporter persists.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::aggregator::{CategoryAggregator, CategoryReport};
use super::config::{ConfigError, GenerationConfig};
use crate::categories::{Category, CategoryCatalog};
use crate::error::ValidatorError;
use crate::llm::TextBackend;
use crate::validation::RecordValidator;

/// Errors that abort a generation run before anything is written.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The validator could not be built.
    #[error("Validator error: {0}")]
    Validator(#[from] ValidatorError),

    /// A selected category has no catalog definition.
    #[error("Category '{0}' is not in the catalog")]
    NotInCatalog(Category),
}

/// Everything produced by one run, in catalog order.
#[derive(Debug, Clone)]
pub struct GenerationRun {
    pub started_at: DateTime<Utc>,
    pub reports: Vec<CategoryReport>,
}

impl GenerationRun {
    pub fn total_records(&self) -> usize {
        self.reports.iter().map(|r| r.stats.prompt_count).sum()
    }

    pub fn total_forking(&self) -> usize {
        self.reports.iter().map(|r| r.stats.forking_count).sum()
    }

    /// Forking share across all categories.
    pub fn overall_forking_ratio(&self) -> f64 {
        match self.total_records() {
            0 => 0.0,
            total => self.total_forking() as f64 / total as f64,
        }
    }

    /// Categories that finished below their minimum.
    pub fn below_minimum(&self) -> Vec<Category> {
        self.reports
            .iter()
            .filter(|r| !r.stats.meets_minimum_requirement)
            .map(|r| r.category)
            .collect()
    }
}

/// Runs the aggregator over every selected category.
pub struct PipelineOrchestrator {
    aggregator: CategoryAggregator,
    categories: Vec<Category>,
}

impl PipelineOrchestrator {
    /// Validate `config` and wire the validator and aggregator.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` for invalid settings,
    /// `PipelineError::NotInCatalog` if a selected category is missing from
    /// `catalog`, and `PipelineError::Validator` if the repair table does not
    /// compile.
    pub fn new(
        config: GenerationConfig,
        catalog: Arc<CategoryCatalog>,
        backend: Arc<dyn TextBackend>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let categories = config.selected_categories();
        if let Some(missing) = categories.iter().find(|c| catalog.get(**c).is_none()) {
            return Err(PipelineError::NotInCatalog(*missing));
        }

        let validator = Arc::new(
            RecordValidator::new(Arc::clone(&catalog))?.with_quality_gate(config.quality_gate),
        );
        let aggregator = CategoryAggregator::new(catalog, validator, backend, config);

        Ok(Self {
            aggregator,
            categories,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Build every selected category in catalog order.
    pub async fn run(&mut self) -> Result<GenerationRun, PipelineError> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let mut reports = Vec::with_capacity(self.categories.len());

        for category in self.categories.clone() {
            let report = self.aggregator.build(category).await?;
            tracing::info!(
                category = %category,
                prompts = report.stats.prompt_count,
                traditional = report.stats.traditional_count,
                forking = report.stats.forking_count,
                filtered_out = report.stats.filtered_out_count,
                rounds = report.rounds,
                "Category complete"
            );
            reports.push(report);
        }

        let run = GenerationRun {
            started_at,
            reports,
        };

        tracing::info!(
            categories = run.reports.len(),
            records = run.total_records(),
            forking_ratio = format!("{:.2}", run.overall_forking_ratio()),
            below_minimum = run.below_minimum().len(),
            elapsed_secs = timer.elapsed().as_secs(),
            "Generation finished"
        );

        Ok(run)
    }
}
