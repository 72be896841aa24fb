//! End-to-end pipeline tests against a stub backend.
//!
//! Covers orchestration, validation, export and reload without network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use forkgen::categories::{Category, CategoryCatalog};
use forkgen::dataset::{count_placeholders, VariantKind};
use forkgen::export::{load_dataset, DatasetWriter};
use forkgen::llm::{BackendFailure, TextBackend};
use forkgen::pipeline::{BackendShare, GenerationConfig, PipelineOrchestrator};
use forkgen::prompts::RequestEnvelope;

/// Answers factual-recall requests with valid items and everything else with prose.
struct FactualOnlyBackend {
    calls: AtomicUsize,
}

#[async_trait]
impl TextBackend for FactualOnlyBackend {
    async fn generate(
        &self,
        envelope: &RequestEnvelope,
        _backend_id: &str,
    ) -> Result<String, BackendFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if envelope.category != Category::FactualRecall {
            return Ok("I'm sorry, I cannot help with that request.".to_string());
        }

        let items: Vec<serde_json::Value> = (0..envelope.requested)
            .map(|i| match envelope.variant {
                VariantKind::Traditional => serde_json::json!({
                    "prompt": format!("The chemical symbol of element number {} is {{}}.", i + 1),
                    "name_pair": ["H", "He"],
                    "complexity": "low",
                    "reasoning_depth": 1,
                    "perspective": "third",
                }),
                VariantKind::Forking => serde_json::json!({
                    "prompt": "The {} of Japan is {} which lies on the island of {}.",
                    "placeholder_pairs": [["capital", "largest port"], ["Tokyo", "Osaka"], ["Honshu", "Kyushu"]],
                    "forking_indices": [1],
                }),
            })
            .collect();

        Ok(serde_json::json!({ "results": items }).to_string())
    }
}

fn seed_count(catalog: &CategoryCatalog, category: Category) -> usize {
    catalog
        .get(category)
        .map(|d| d.seed_records(Utc::now()).len())
        .unwrap()
}

fn config(minimum: usize) -> GenerationConfig {
    GenerationConfig::default()
        .with_categories(vec![Category::FactualRecall, Category::TheoryOfMind])
        .with_backends(vec![BackendShare::new("stub/model", 1.0)])
        .with_target(minimum)
        .with_minimum(minimum)
        .with_batch_size(6)
        .with_category_retries(1)
        .with_seed(42)
}

#[tokio::test]
async fn test_generate_write_and_reload() {
    let catalog = Arc::new(CategoryCatalog::standard());
    let minimum = seed_count(&catalog, Category::TheoryOfMind)
        .max(seed_count(&catalog, Category::FactualRecall))
        + 1;
    let backend = Arc::new(FactualOnlyBackend {
        calls: AtomicUsize::new(0),
    });
    let mut orchestrator = PipelineOrchestrator::new(config(minimum), catalog, backend.clone())
    .unwrap();

    let run = orchestrator.run().await.unwrap();
    assert!(backend.calls.load(Ordering::SeqCst) > 0);

    // Catalog order, not selection order.
    assert_eq!(run.reports[0].category, Category::TheoryOfMind);
    assert_eq!(run.reports[1].category, Category::FactualRecall);
    assert_eq!(
        run.below_minimum(),
        vec![Category::TheoryOfMind],
        "shortfall is reported, not fatal"
    );
    assert_eq!(run.reports[0].rounds, 2);

    let dir = tempfile::tempdir().unwrap();
    let summary = DatasetWriter::new(dir.path()).write(&run).unwrap();
    let document = load_dataset(&summary.path).unwrap();

    assert_eq!(document.categories.len(), 2);
    assert_eq!(document.total_rows(), run.total_records());

    for (category, section) in &document.categories {
        let meta = &section.metadata;
        assert_eq!(meta.prompt_count, section.rows.len());
        assert_eq!(meta.traditional_count + meta.forking_count, meta.prompt_count);
        assert_eq!(meta.original_count + meta.generated_count, meta.prompt_count);
        assert_eq!(section.prompt_format.len(), section.name_pairs.len());
        assert_eq!(section.forking_format.len(), section.forking_indices.len());

        // Seeds come first.
        assert!(section.rows[..meta.original_count]
            .iter()
            .all(|row| row.model_used == "seed"));
        assert!(section.rows[meta.original_count..]
            .iter()
            .all(|row| row.model_used == "stub/model"));

        for row in &section.rows {
            assert_eq!(row.category, *category);
            let placeholders = count_placeholders(&row.prompt);
            if row.is_forking {
                let pairs = row.placeholder_pairs.as_ref().unwrap();
                assert_eq!(pairs.len(), placeholders);
                let index = row.forking_indices.as_ref().unwrap()[0];
                assert!(index < pairs.len());
            } else {
                assert!(placeholders > 0);
            }
        }
    }

    let tom = document.get(Category::TheoryOfMind).unwrap();
    assert_eq!(tom.metadata.generated_count, 0);

    let recall = document.get(Category::FactualRecall).unwrap();
    assert!(recall.metadata.generated_count > 0);
    assert!(recall.forking_format.contains(
        &"The {} of Japan is {} which lies on the island of {}.".to_string()
    ));
    assert_eq!(recall.metadata.models_used, vec!["stub/model".to_string()]);
}

#[tokio::test]
async fn test_met_minimum_is_flagged() {
    let catalog = Arc::new(CategoryCatalog::standard());
    let seeds = seed_count(&catalog, Category::FactualRecall);

    let mut orchestrator = PipelineOrchestrator::new(
        config(seeds + 1).with_categories(vec![Category::FactualRecall]),
        catalog,
        Arc::new(FactualOnlyBackend {
            calls: AtomicUsize::new(0),
        }),
    )
    .unwrap();

    let run = orchestrator.run().await.unwrap();

    assert!(run.below_minimum().is_empty());
    assert_eq!(run.reports[0].rounds, 1);
    assert!(run.overall_forking_ratio() > 0.0 && run.overall_forking_ratio() < 1.0);
}
