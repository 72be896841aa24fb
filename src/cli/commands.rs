//! CLI command definitions for forkgen.
//!
//! `generate` runs the full pipeline and writes one dataset file,
//! `categories` prints the catalog, and `validate` re-checks a written file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::categories::{Category, CategoryCatalog};
use crate::dataset::{RecordSource, VariantKind};
use crate::error::LlmError;
use crate::export::{load_dataset, DatasetWriter};
use crate::llm::retry::DEFAULT_MAX_DELAY;
use crate::llm::{OpenRouterProvider, RetryPolicy, RetryingBackend};
use crate::metrics::{export_metrics, init_metrics};
use crate::parser::CandidateRecord;
use crate::pipeline::{BackendShare, GenerationConfig, GenerationRun, PipelineOrchestrator};
use crate::validation::{RecordValidator, ValidationOutcome};

/// Forking-token prompt dataset generator.
#[derive(Parser)]
#[command(name = "forkgen")]
#[command(about = "Generate validated forking-token prompt datasets")]
#[command(version)]
#[command(
    long_about = "forkgen asks LLM backends for contrast-pair prompts in seven cognitive categories, validates and repairs them, and writes one JSON dataset per run.\n\nExample usage:\n  forkgen generate --target 40 --minimum 30 --output ./generated-datasets"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a dataset for the selected categories.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// List the category catalog.
    Categories,

    /// Re-run the validator over a written dataset file.
    Validate(ValidateArgs),
}

/// Arguments for the generate command.
///
/// Every tuning flag overrides the config file and `FORKGEN_*` variables.
#[derive(Parser, Debug, Default)]
pub struct GenerateArgs {
    /// YAML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory for the dataset file.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Categories to generate (comma-separated or repeated).
    #[arg(
        short = 'c',
        long = "category",
        visible_alias = "categories",
        value_delimiter = ','
    )]
    pub categories: Vec<String>,

    /// Backend share as `model=share` or `model=share:high` (repeatable).
    #[arg(short = 'b', long = "backend")]
    pub backends: Vec<String>,

    /// Generated prompts requested per category per round.
    #[arg(short = 't', long)]
    pub target: Option<usize>,

    /// Records a category needs, seeds included.
    #[arg(long)]
    pub minimum: Option<usize>,

    /// Prompts per backend call on the first round.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Fraction of each batch requested as forking prompts.
    #[arg(long)]
    pub forking_ratio: Option<f64>,

    /// Extra rounds for categories below the minimum.
    #[arg(long)]
    pub retries: Option<u32>,

    /// RNG seed for reproducible example sampling.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the length, terminal and ellipsis checks.
    #[arg(long)]
    pub no_quality_gate: bool,

    /// Write Prometheus metrics in text format here after the run.
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,

    /// Print the run summary as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,

    /// OpenRouter API key.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Arguments for the validate command.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Dataset file written by `forkgen generate`.
    pub file: PathBuf,

    /// Skip the length, terminal and ellipsis checks.
    #[arg(long)]
    pub no_quality_gate: bool,

    /// Print the report as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// For control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate_command(args).await,
        Commands::Categories => run_categories_command(),
        Commands::Validate(args) => run_validate_command(args),
    }
}

// ============================================================================
// Generate Command Implementation
// ============================================================================

/// Layer config file, environment and flags into one validated config.
pub fn resolve_config(args: &GenerateArgs) -> anyhow::Result<GenerationConfig> {
    let base = match &args.config {
        Some(path) => GenerationConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => GenerationConfig::default(),
    };

    let config = apply_overrides(
        base.with_env_overrides(|key| std::env::var(key).ok())?,
        args,
    )?;
    config.validate()?;
    Ok(config)
}

/// Apply command-line flags on top of `config`.
pub fn apply_overrides(
    mut config: GenerationConfig,
    args: &GenerateArgs,
) -> anyhow::Result<GenerationConfig> {
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }

    if !args.categories.is_empty() {
        config.categories = args
            .categories
            .iter()
            .map(|name| name.parse::<Category>())
            .collect::<Result<_, _>>()?;
    }

    if !args.backends.is_empty() {
        config.backends = args
            .backends
            .iter()
            .map(|entry| BackendShare::parse(entry))
            .collect::<Result<_, _>>()?;
    }

    if let Some(target) = args.target {
        config.target_per_category = target;
    }
    if let Some(minimum) = args.minimum {
        config.min_per_category = minimum;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(ratio) = args.forking_ratio {
        config.forking_ratio = ratio;
    }
    if let Some(retries) = args.retries {
        config.category_retries = retries;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if args.no_quality_gate {
        config.quality_gate = false;
    }
    if let Some(path) = &args.metrics_out {
        config.metrics_path = Some(path.clone());
    }

    Ok(config)
}

/// Per-category line of the run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub prompt_count: usize,
    pub traditional_count: usize,
    pub forking_count: usize,
    pub forking_ratio: f64,
    pub filtered_out_count: usize,
    pub meets_minimum_requirement: bool,
}

/// JSON output structure for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// "success", or "partial" when a category is below its minimum.
    pub status: String,
    pub output_path: String,
    pub total_records: usize,
    pub overall_forking_ratio: f64,
    pub categories: Vec<CategorySummary>,
    pub below_minimum: Vec<String>,
    pub total_duration_ms: u64,
}

impl GenerationOutput {
    pub fn from_run(run: &GenerationRun, output_path: &Path, elapsed: Duration) -> Self {
        let below_minimum: Vec<String> = run
            .below_minimum()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();

        Self {
            status: if below_minimum.is_empty() {
                "success".to_string()
            } else {
                "partial".to_string()
            },
            output_path: output_path.display().to_string(),
            total_records: run.total_records(),
            overall_forking_ratio: run.overall_forking_ratio(),
            categories: run
                .reports
                .iter()
                .map(|report| CategorySummary {
                    category: report.category.as_str().to_string(),
                    prompt_count: report.stats.prompt_count,
                    traditional_count: report.stats.traditional_count,
                    forking_count: report.stats.forking_count,
                    forking_ratio: report.stats.forking_ratio(),
                    filtered_out_count: report.stats.filtered_out_count,
                    meets_minimum_requirement: report.stats.meets_minimum_requirement,
                })
                .collect(),
            below_minimum,
            total_duration_ms: elapsed.as_millis() as u64,
        }
    }

    fn print_text(&self) {
        println!("Dataset written to {}", self.output_path);
        println!();
        println!(
            "{:<28} {:>7} {:>12} {:>8} {:>8} {:>9}",
            "category", "total", "traditional", "forking", "ratio", "filtered"
        );
        for c in &self.categories {
            let marker = if c.meets_minimum_requirement { "" } else { "  (below minimum)" };
            println!(
                "{:<28} {:>7} {:>12} {:>8} {:>8.2} {:>9}{}",
                c.category,
                c.prompt_count,
                c.traditional_count,
                c.forking_count,
                c.forking_ratio,
                c.filtered_out_count,
                marker
            );
        }
        println!();
        println!(
            "Total: {} records, overall forking ratio {:.2}",
            self.total_records, self.overall_forking_ratio
        );
        if !self.below_minimum.is_empty() {
            println!("Below minimum: {}", self.below_minimum.join(", "));
        }
    }
}

async fn run_generate_command(args: GenerateArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;

    let api_key = args
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or(LlmError::MissingApiKey)?;

    init_metrics().map_err(|e| anyhow::anyhow!("Failed to initialize metrics: {}", e))?;

    let provider = OpenRouterProvider::new(api_key);
    info!(
        api_key = %provider.api_key_masked(),
        backends = ?config.backends.iter().map(|b| b.model.as_str()).collect::<Vec<_>>(),
        "Using OpenRouter"
    );

    let policy = RetryPolicy::exponential(
        config.backend_attempts,
        Duration::from_millis(config.retry_base_delay_ms),
        DEFAULT_MAX_DELAY,
    );
    let backend = Arc::new(RetryingBackend::new(Arc::new(provider)).with_policy(policy));

    let writer = DatasetWriter::new(config.output_dir.clone());
    let metrics_path = config.metrics_path.clone();
    let catalog = Arc::new(CategoryCatalog::standard());

    let start = Instant::now();
    let mut orchestrator = PipelineOrchestrator::new(config, catalog, backend)?;
    let run = orchestrator.run().await?;

    let summary = writer.write(&run)?;
    let output = GenerationOutput::from_run(&run, &summary.path, start.elapsed());

    if let Some(path) = metrics_path {
        std::fs::write(&path, export_metrics())
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "Metrics written");
    }

    for category in &output.below_minimum {
        warn!(category = %category, "Category is below the minimum record count");
    }

    if args.json {
        let json_output = serde_json::to_string_pretty(&output)
            .map_err(|e| anyhow::anyhow!("Failed to serialize JSON output: {}", e))?;
        println!("{}", json_output);
    } else {
        output.print_text();
    }

    Ok(())
}

// ============================================================================
// Categories Command Implementation
// ============================================================================

fn run_categories_command() -> anyhow::Result<()> {
    let catalog = CategoryCatalog::standard();

    println!(
        "{:<28} {:>12} {:>8} {:>10} {:>6} {:>6}",
        "category", "traditional", "forking", "min words", "seeds", "hard"
    );
    for definition in catalog.iter() {
        let forking_seeds = definition.forking_seeds.len();
        println!(
            "{:<28} {:>12} {:>8} {:>10} {:>6} {:>6}",
            definition.category.as_str(),
            definition.traditional_range.to_string(),
            definition.required_forking_placeholders(),
            definition.min_words,
            definition.seed_templates.len() + forking_seeds,
            if definition.hard { "yes" } else { "no" }
        );
    }

    Ok(())
}

// ============================================================================
// Validate Command Implementation
// ============================================================================

/// Outcome counts for one category of a re-validated file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryValidation {
    pub checked: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Rejection reason text to occurrence count.
    pub reasons: BTreeMap<String, usize>,
}

/// Result of re-validating a dataset file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetValidationReport {
    pub categories: BTreeMap<String, CategoryValidation>,
    /// Seed rows are not re-validated.
    pub skipped_seeds: usize,
}

impl DatasetValidationReport {
    pub fn accepted(&self) -> usize {
        self.categories.values().map(|c| c.accepted).sum()
    }

    pub fn rejected(&self) -> usize {
        self.categories.values().map(|c| c.rejected).sum()
    }
}

/// Re-run `validator` over every generated row of the file at `path`.
pub fn validate_dataset(
    path: &Path,
    validator: &RecordValidator,
) -> anyhow::Result<DatasetValidationReport> {
    let document = load_dataset(path)
        .with_context(|| format!("Failed to load dataset {}", path.display()))?;
    let mut report = DatasetValidationReport::default();

    for (category, section) in &document.categories {
        let entry = report
            .categories
            .entry(category.as_str().to_string())
            .or_default();

        for row in &section.rows {
            let source = RecordSource::from_label(&row.model_used);
            if source == RecordSource::Seed {
                report.skipped_seeds += 1;
                continue;
            }

            let value: Value = serde_json::to_value(row)?;
            let Some(candidate) = CandidateRecord::from_value(&value) else {
                continue;
            };
            let variant = if row.is_forking {
                VariantKind::Forking
            } else {
                VariantKind::Traditional
            };

            entry.checked += 1;
            match validator.validate(*category, variant, &candidate, source) {
                ValidationOutcome::Accepted(_) => entry.accepted += 1,
                ValidationOutcome::Rejected(rejection) => {
                    entry.rejected += 1;
                    for reason in &rejection.reasons {
                        *entry.reasons.entry(reason.to_string()).or_default() += 1;
                    }
                }
            }
        }
    }

    Ok(report)
}

fn run_validate_command(args: ValidateArgs) -> anyhow::Result<()> {
    let catalog = Arc::new(CategoryCatalog::standard());
    let validator = RecordValidator::new(catalog)?.with_quality_gate(!args.no_quality_gate);
    let report = validate_dataset(&args.file, &validator)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for (category, result) in &report.categories {
        println!(
            "{:<28} checked {:>5}  accepted {:>5}  rejected {:>5}",
            category, result.checked, result.accepted, result.rejected
        );
        for (reason, count) in &result.reasons {
            println!("    {:>5} x {}", count, reason);
        }
    }
    println!();
    println!(
        "Accepted {}, rejected {}, seed rows skipped {}",
        report.accepted(),
        report.rejected(),
        report.skipped_seeds
    );

    Ok(())
}
