//! Per-category accumulation of seed and generated records.
//!
//! A category starts from its seed records and then runs up to
//! `category_retries + 1` rounds. Each round fans out one batch per chunk
//! per backend share, waits for every batch at a single join point, and only
//! then merges the validated records. Nothing is shared mutably between the
//! concurrent batches.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::config::GenerationConfig;
use super::PipelineError;
use crate::categories::{Category, CategoryCatalog, CategoryDefinition};
use crate::dataset::{PromptRecord, RecordSource, VariantKind};
use crate::llm::TextBackend;
use crate::metrics::MetricsCollector;
use crate::parser::{parse_plain_text, parse_response, CandidateRecord};
use crate::prompts::{build_plain_text_fallback, build_request, RequestEnvelope};
use crate::validation::{RecordValidator, ValidationOutcome};

/// Summary statistics persisted as a category's `metadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub prompt_count: usize,
    pub original_count: usize,
    pub generated_count: usize,
    pub traditional_count: usize,
    pub forking_count: usize,
    pub filtered_out_count: usize,
    pub meets_minimum_requirement: bool,
    pub models_used: Vec<String>,
}

impl CategoryStats {
    /// Forking share of all records, 0.0 for an empty category.
    pub fn forking_ratio(&self) -> f64 {
        if self.prompt_count == 0 {
            0.0
        } else {
            self.forking_count as f64 / self.prompt_count as f64
        }
    }
}

/// Result of aggregating one category.
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub category: Category,
    pub description: String,
    /// Seed records first, then generated records.
    pub records: Vec<PromptRecord>,
    pub stats: CategoryStats,
    /// Rounds actually run.
    pub rounds: u32,
}

impl CategoryReport {
    pub fn traditional(&self) -> impl Iterator<Item = &PromptRecord> {
        self.records.iter().filter(|r| !r.is_forking())
    }

    pub fn forking(&self) -> impl Iterator<Item = &PromptRecord> {
        self.records.iter().filter(|r| r.is_forking())
    }
}

/// One backend call planned for a round.
#[derive(Debug, Clone)]
struct BatchJob {
    model: String,
    envelope: RequestEnvelope,
}

/// What one batch contributed; owned by the batch until the join.
#[derive(Debug, Default)]
struct BatchResult {
    accepted: Vec<PromptRecord>,
    rejected: usize,
}

/// Drives seed inclusion, batch fan-out and bounded retry rounds.
pub struct CategoryAggregator {
    catalog: Arc<CategoryCatalog>,
    validator: Arc<RecordValidator>,
    backend: Arc<dyn TextBackend>,
    config: GenerationConfig,
    rng: ChaCha8Rng,
    metrics: MetricsCollector,
}

impl CategoryAggregator {
    /// Create an aggregator.
    ///
    /// The RNG is seeded from `config.seed` when set, otherwise from the
    /// thread RNG.
    pub fn new(
        catalog: Arc<CategoryCatalog>,
        validator: Arc<RecordValidator>,
        backend: Arc<dyn TextBackend>,
        config: GenerationConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        Self {
            catalog,
            validator,
            backend,
            config,
            rng,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Build the full record list for `category`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NotInCatalog` if the catalog has no definition
    /// for `category`. Backend and validation failures never error; they
    /// shrink the result instead.
    pub async fn build(&mut self, category: Category) -> Result<CategoryReport, PipelineError> {
        let catalog = Arc::clone(&self.catalog);
        let definition = catalog
            .get(category)
            .ok_or(PipelineError::NotInCatalog(category))?;

        let seeds = definition.seed_records(Utc::now());
        let original_count = seeds.len();
        let min_required = self.config.min_per_category;
        let max_rounds = self.config.category_retries + 1;

        let mut generated: Vec<PromptRecord> = Vec::new();
        let mut filtered_out = 0;
        let mut rounds = 0;

        tracing::info!(
            category = %category,
            seeds = original_count,
            target = self.config.target_for(definition),
            minimum = min_required,
            "Building category"
        );

        // At least one round always runs, even when seeds alone meet the minimum.
        loop {
            let round = rounds;
            rounds += 1;

            let jobs = self.plan_round(definition, round);
            tracing::info!(
                category = %category,
                round = round,
                batches = jobs.len(),
                requested = jobs.iter().map(|j| j.envelope.requested).sum::<usize>(),
                "Starting round"
            );

            let results = join_all(jobs.iter().map(|job| self.run_batch(job))).await;

            for result in results {
                filtered_out += result.rejected;
                generated.extend(result.accepted);
            }

            let total = original_count + generated.len();
            if total >= min_required || rounds >= max_rounds {
                break;
            }
            tracing::warn!(
                category = %category,
                have = total,
                needed = min_required,
                "Category below minimum, retrying"
            );
        }

        let mut records = seeds;
        records.extend(generated);

        let stats = self.stats(&records, original_count, filtered_out);
        if !stats.meets_minimum_requirement {
            tracing::warn!(
                category = %category,
                rounds = rounds,
                have = stats.prompt_count,
                needed = min_required,
                "Category finished below minimum"
            );
        }

        self.metrics.record_category(
            category,
            stats.original_count,
            stats.generated_count,
            stats.meets_minimum_requirement,
        );

        Ok(CategoryReport {
            category,
            description: definition.description.clone(),
            records,
            stats,
            rounds,
        })
    }

    /// Prompt count each backend is asked for in `round`.
    fn backend_counts(&self, definition: &CategoryDefinition, round: u32) -> Vec<(String, usize)> {
        let target = self.config.target_for(definition) as f64;

        self.config
            .backends
            .iter()
            .map(|backend| {
                let mut share = backend.share;
                if definition.hard && round > 0 && backend.high_capability {
                    share += self.config.high_capability_boost * round as f64;
                }
                (backend.model.clone(), (target * share).round() as usize)
            })
            .collect()
    }

    /// Prompts per batch in `round`: grows by half the base size per round.
    fn chunk_size(&self, round: u32) -> usize {
        let widened = self.config.batch_size as f64 * (1.0 + 0.5 * round as f64);
        (widened as usize).clamp(1, self.config.max_batch_size.max(1))
    }

    fn plan_round(&mut self, definition: &CategoryDefinition, round: u32) -> Vec<BatchJob> {
        let chunk = self.chunk_size(round);
        let mut jobs = Vec::new();

        for (model, count) in self.backend_counts(definition, round) {
            let mut offset = 0;
            while offset < count {
                let n = chunk.min(count - offset);
                offset += n;

                let forking = ((n as f64 * self.config.forking_ratio).round() as usize).min(n);
                let traditional = n - forking;

                for (variant, size) in [
                    (VariantKind::Forking, forking),
                    (VariantKind::Traditional, traditional),
                ] {
                    if size == 0 {
                        continue;
                    }
                    let envelope = build_request(definition, variant, size, &model, &mut self.rng);
                    jobs.push(BatchJob {
                        model: model.clone(),
                        envelope,
                    });
                }
            }
        }

        jobs
    }

    /// Fetch, parse and validate one batch. Never fails; problems shrink
    /// the batch.
    async fn run_batch(&self, job: &BatchJob) -> BatchResult {
        let envelope = &job.envelope;
        let category = envelope.category;
        let variant = envelope.variant;

        let candidates = match self.fetch_candidates(job).await {
            Some(candidates) => candidates,
            None => {
                self.metrics.record_parse_failure(category, variant);
                return BatchResult::default();
            }
        };

        let mut result = BatchResult::default();
        let source = RecordSource::Model(job.model.clone());

        for candidate in &candidates {
            match self
                .validator
                .validate(category, variant, candidate, source.clone())
            {
                ValidationOutcome::Accepted(record) => {
                    self.metrics.record_candidate(category, variant, true);
                    result.accepted.push(record);
                }
                ValidationOutcome::Rejected(rejection) => {
                    self.metrics.record_candidate(category, variant, false);
                    tracing::warn!(model = %job.model, "{}", rejection);
                    result.rejected += 1;
                }
            }
        }

        tracing::debug!(
            category = %category,
            variant = %variant,
            model = %job.model,
            requested = envelope.requested,
            accepted = result.accepted.len(),
            rejected = result.rejected,
            "Batch complete"
        );

        result
    }

    /// Up to `parse_attempts` structured calls, then the plain-text fallback
    /// for traditional batches. `None` when nothing usable came back.
    async fn fetch_candidates(&self, job: &BatchJob) -> Option<Vec<CandidateRecord>> {
        let envelope = &job.envelope;

        for attempt in 1..=self.config.parse_attempts {
            let raw = match self.backend.generate(envelope, &job.model).await {
                Ok(raw) => raw,
                Err(failure) => {
                    tracing::warn!(
                        category = %envelope.category,
                        variant = %envelope.variant,
                        model = %job.model,
                        error = %failure,
                        "Backend failed, treating batch as empty"
                    );
                    return None;
                }
            };

            match parse_response(&raw) {
                Ok(candidates) if !candidates.is_empty() => return Some(candidates),
                Ok(_) => tracing::warn!(
                    category = %envelope.category,
                    model = %job.model,
                    attempt = attempt,
                    "Response contained no candidates"
                ),
                Err(e) => tracing::warn!(
                    category = %envelope.category,
                    model = %job.model,
                    attempt = attempt,
                    error = %e,
                    "Could not parse response"
                ),
            }
        }

        if envelope.variant != VariantKind::Traditional {
            return None;
        }

        let fallback = build_plain_text_fallback(envelope);
        match self.backend.generate(&fallback, &job.model).await {
            Ok(raw) => {
                let candidates = parse_plain_text(&raw);
                tracing::info!(
                    category = %envelope.category,
                    model = %job.model,
                    candidates = candidates.len(),
                    "Plain-text fallback"
                );
                Some(candidates).filter(|c| !c.is_empty())
            }
            Err(failure) => {
                tracing::warn!(
                    category = %envelope.category,
                    model = %job.model,
                    error = %failure,
                    "Plain-text fallback failed"
                );
                None
            }
        }
    }

    fn stats(
        &self,
        records: &[PromptRecord],
        original_count: usize,
        filtered_out_count: usize,
    ) -> CategoryStats {
        let forking_count = records.iter().filter(|r| r.is_forking()).count();

        CategoryStats {
            prompt_count: records.len(),
            original_count,
            generated_count: records.len() - original_count,
            traditional_count: records.len() - forking_count,
            forking_count,
            filtered_out_count,
            meets_minimum_requirement: records.len() >= self.config.min_per_category,
            models_used: self
                .config
                .backends
                .iter()
                .map(|b| b.model.clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{BackendFailure, FailureKind};
    use crate::pipeline::BackendShare;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers every request with `requested` well-formed factual-recall items.
    struct WellFormedBackend {
        calls: AtomicUsize,
    }

    impl WellFormedBackend {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    fn well_formed_batch(envelope: &RequestEnvelope) -> String {
        let items: Vec<serde_json::Value> = (0..envelope.requested)
            .map(|i| match envelope.variant {
                VariantKind::Traditional => serde_json::json!({
                    "prompt": format!("The capital city of country number {} is {{}}.", i),
                    "name_pair": ["Paris", "Rome"],
                    "complexity": "low",
                    "reasoning_depth": 1,
                }),
                VariantKind::Forking => serde_json::json!({
                    "prompt": "The {} of France is {} and it sits on the {}.",
                    "placeholder_pairs": [["capital", "largest port"], ["Paris", "Marseille"], ["Seine", "Rhone"]],
                    "forking_indices": [1],
                }),
            })
            .collect();
        serde_json::json!({ "results": items }).to_string()
    }

    #[async_trait]
    impl TextBackend for WellFormedBackend {
        async fn generate(
            &self,
            envelope: &RequestEnvelope,
            _backend_id: &str,
        ) -> Result<String, BackendFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(well_formed_batch(envelope))
        }
    }

    /// Always fails like an exhausted retry loop.
    struct DownBackend;

    #[async_trait]
    impl TextBackend for DownBackend {
        async fn generate(
            &self,
            _envelope: &RequestEnvelope,
            _backend_id: &str,
        ) -> Result<String, BackendFailure> {
            Err(BackendFailure::new(FailureKind::Timeout, 3, "timed out"))
        }
    }

    /// Returns scripted raw responses in order, then empty strings.
    struct ScriptedBackend {
        responses: Mutex<Vec<String>>,
        seen: Mutex<Vec<(bool, usize)>>,
    }

    #[async_trait]
    impl TextBackend for ScriptedBackend {
        async fn generate(
            &self,
            envelope: &RequestEnvelope,
            _backend_id: &str,
        ) -> Result<String, BackendFailure> {
            self.seen
                .lock()
                .unwrap()
                .push((envelope.json_output, envelope.requested));
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(String::new())
            } else {
                Ok(responses.remove(0))
            }
        }
    }

    fn aggregator(backend: Arc<dyn TextBackend>, config: GenerationConfig) -> CategoryAggregator {
        let catalog = Arc::new(CategoryCatalog::standard());
        let validator = Arc::new(RecordValidator::new(Arc::clone(&catalog)).unwrap());
        CategoryAggregator::new(catalog, validator, backend, config.with_seed(11))
    }

    fn single_backend() -> Vec<BackendShare> {
        vec![BackendShare::new("stub/model", 1.0)]
    }

    fn seed_count(category: Category) -> usize {
        CategoryDefinition::standard(category)
            .seed_records(Utc::now())
            .len()
    }

    #[tokio::test]
    async fn test_minimum_met_on_first_round_stops() {
        let backend = Arc::new(WellFormedBackend::new());
        let config = GenerationConfig::default()
            .with_backends(single_backend())
            .with_target(16)
            .with_minimum(seed_count(Category::FactualRecall) + 10)
            .with_batch_size(8);
        let mut agg = aggregator(backend.clone(), config);

        let report = agg.build(Category::FactualRecall).await.unwrap();

        assert_eq!(report.rounds, 1);
        assert!(report.stats.meets_minimum_requirement);
        assert_eq!(report.stats.generated_count, 16);
        // two chunks of 8, each split into a forking and a traditional call
        assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
        assert_eq!(report.stats.forking_count, report.forking().count());
    }

    #[tokio::test]
    async fn test_seeds_precede_generated_records() {
        let backend = Arc::new(WellFormedBackend::new());
        let config = GenerationConfig::default()
            .with_backends(single_backend())
            .with_target(8)
            .with_minimum(seed_count(Category::FactualRecall) + 1);
        let mut agg = aggregator(backend, config);

        let report = agg.build(Category::FactualRecall).await.unwrap();
        let seeds = report.stats.original_count;
        assert_eq!(report.stats.generated_count, 8);

        assert!(seeds > 0);
        assert!(report.records[..seeds]
            .iter()
            .all(|r| r.source == RecordSource::Seed));
        assert!(report.records[seeds..]
            .iter()
            .all(|r| r.source == RecordSource::Model("stub/model".to_string())));
    }

    #[tokio::test]
    async fn test_minimum_reached_exactly_on_final_round() {
        let seeds = seed_count(Category::FactualRecall);

        // Each round yields 8 records; two rounds are allowed.
        let backend = Arc::new(WellFormedBackend::new());
        let config = GenerationConfig::default()
            .with_backends(single_backend())
            .with_target(8)
            .with_minimum(seeds + 16)
            .with_batch_size(8)
            .with_max_batch_size(8)
            .with_category_retries(1);
        let mut agg = aggregator(backend.clone(), config);

        let report = agg.build(Category::FactualRecall).await.unwrap();

        assert_eq!(report.rounds, 2);
        assert_eq!(report.stats.prompt_count, seeds + 16);
        assert!(report.stats.meets_minimum_requirement);
    }

    #[tokio::test]
    async fn test_rounds_are_bounded_when_minimum_unreachable() {
        let backend = Arc::new(WellFormedBackend::new());
        let config = GenerationConfig::default()
            .with_backends(single_backend())
            .with_target(4)
            .with_minimum(300)
            .with_category_retries(2);
        let mut agg = aggregator(backend, config);

        let report = agg.build(Category::FactualRecall).await.unwrap();

        assert_eq!(report.rounds, 3);
        assert!(!report.stats.meets_minimum_requirement);
        assert_eq!(report.stats.generated_count, 12);
    }

    #[tokio::test]
    async fn test_backend_failure_yields_empty_batches() {
        let config = GenerationConfig::default()
            .with_backends(single_backend())
            .with_target(8)
            .with_minimum(200)
            .with_category_retries(1);
        let mut agg = aggregator(Arc::new(DownBackend), config);

        let report = agg.build(Category::Counterfactual).await.unwrap();

        assert_eq!(report.stats.generated_count, 0);
        assert_eq!(report.stats.prompt_count, report.stats.original_count);
        assert!(!report.stats.meets_minimum_requirement);
        assert_eq!(report.rounds, 2);
    }

    #[tokio::test]
    async fn test_traditional_batch_falls_back_to_plain_text() {
        let plain = "PROMPT: The chemical symbol for gold on the periodic table is {}.\nCORRECT: Au\nDISTRACTOR: Ag\n";
        let backend = Arc::new(ScriptedBackend {
            responses: Mutex::new(vec![
                "sorry, no json".to_string(),
                "still no json".to_string(),
                plain.to_string(),
            ]),
            seen: Mutex::new(Vec::new()),
        });
        let config = GenerationConfig::default()
            .with_backends(single_backend())
            .with_target(1)
            .with_minimum(seed_count(Category::FactualRecall) + 1)
            .with_forking_ratio(0.0);
        let mut agg = aggregator(backend.clone(), config);

        let report = agg.build(Category::FactualRecall).await.unwrap();

        let seen = backend.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![(true, 1), (true, 1), (false, 1)]);
        assert_eq!(report.stats.generated_count, 1);
        assert!(report.records.iter().any(|r| r.prompt.contains("gold")));
    }

    #[tokio::test]
    async fn test_rejections_are_counted() {
        let bad = serde_json::json!({
            "results": [
                {"prompt": "The capital city of Japan is {}.", "name_pair": ["Tokyo", "Kyoto"]},
                {"prompt": "No placeholder in this prompt at all.", "name_pair": ["a", "b"]},
                {"prompt": "The capital of Peru is {}.", "name_pair": ["Lima"]}
            ]
        })
        .to_string();
        let backend = Arc::new(ScriptedBackend {
            responses: Mutex::new(vec![bad]),
            seen: Mutex::new(Vec::new()),
        });
        let config = GenerationConfig::default()
            .with_backends(single_backend())
            .with_target(3)
            .with_minimum(seed_count(Category::FactualRecall) + 1)
            .with_forking_ratio(0.0);
        let mut agg = aggregator(backend, config);

        let report = agg.build(Category::FactualRecall).await.unwrap();

        assert_eq!(report.stats.generated_count, 1);
        assert_eq!(report.stats.filtered_out_count, 2);
    }

    #[test]
    fn test_backend_counts_boost_hard_category_on_retry() {
        let config = GenerationConfig::default().with_target(100);
        let agg = aggregator(Arc::new(DownBackend), config);
        let tom = CategoryDefinition::standard(Category::TheoryOfMind);
        let recall = CategoryDefinition::standard(Category::FactualRecall);

        assert_eq!(
            agg.backend_counts(&tom, 0),
            vec![
                ("openai/gpt-4.1".to_string(), 105),
                ("openai/gpt-4.5-preview".to_string(), 45)
            ]
        );
        assert_eq!(agg.backend_counts(&tom, 1)[1].1, 60);
        assert_eq!(agg.backend_counts(&recall, 1)[1].1, 30);
    }

    #[test]
    fn test_chunk_size_widens_and_caps() {
        let agg = aggregator(Arc::new(DownBackend), GenerationConfig::default());
        assert_eq!(agg.chunk_size(0), 8);
        assert_eq!(agg.chunk_size(1), 12);
        assert_eq!(agg.chunk_size(2), 16);
        assert_eq!(agg.chunk_size(3), 18);
    }

    #[test]
    fn test_plan_round_splits_by_ratio() {
        let config = GenerationConfig::default()
            .with_backends(single_backend())
            .with_target(10)
            .with_batch_size(8);
        let mut agg = aggregator(Arc::new(DownBackend), config);
        let def = CategoryDefinition::standard(Category::FactualRecall);

        let sizes: Vec<(VariantKind, usize)> = agg
            .plan_round(&def, 0)
            .iter()
            .map(|j| (j.envelope.variant, j.envelope.requested))
            .collect();

        assert_eq!(
            sizes,
            vec![
                (VariantKind::Forking, 4),
                (VariantKind::Traditional, 4),
                (VariantKind::Forking, 1),
                (VariantKind::Traditional, 1),
            ]
        );
    }

    #[test]
    fn test_forking_ratio_stat() {
        let stats = CategoryStats {
            prompt_count: 10,
            original_count: 2,
            generated_count: 8,
            traditional_count: 6,
            forking_count: 4,
            filtered_out_count: 0,
            meets_minimum_requirement: true,
            models_used: vec![],
        };
        assert!((stats.forking_ratio() - 0.4).abs() < f64::EPSILON);
    }
}
