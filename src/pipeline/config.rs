//! Generation run configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `FORKGEN_*` environment variables, then CLI flags. [`GenerationConfig::validate`]
//! runs once all layers are applied.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::categories::{Category, CategoryDefinition};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A setting has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// The configuration file is not valid YAML for this schema.
    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One backend identity and the fraction of each round it is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendShare {
    /// Model identifier passed to the provider.
    pub model: String,
    /// Fraction of the per-round target, in `(0, 1]`.
    pub share: f64,
    /// Gets extra share on hard-category retry rounds.
    #[serde(default)]
    pub high_capability: bool,
}

impl BackendShare {
    pub fn new(model: impl Into<String>, share: f64) -> Self {
        Self {
            model: model.into(),
            share,
            high_capability: false,
        }
    }

    pub fn high_capability(mut self) -> Self {
        self.high_capability = true;
        self
    }

    /// Parses `model=share` or `model=share:high`.
    ///
    /// Splits on the last `=` so model identifiers may contain `=` or `:`.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "backend".to_string(),
            message,
        };

        let (model, rest) = entry
            .rsplit_once('=')
            .ok_or_else(|| invalid(format!("expected model=share, got '{}'", entry)))?;
        let model = model.trim();
        if model.is_empty() {
            return Err(invalid(format!("missing model name in '{}'", entry)));
        }

        let (share, flag) = match rest.split_once(':') {
            Some((share, flag)) => (share, Some(flag.trim())),
            None => (rest, None),
        };
        let share: f64 = share
            .trim()
            .parse()
            .map_err(|_| invalid(format!("could not parse share in '{}'", entry)))?;

        let backend = Self::new(model, share);
        match flag {
            None => Ok(backend),
            Some("high") => Ok(backend.high_capability()),
            Some(other) => Err(invalid(format!("unknown backend flag '{}'", other))),
        }
    }
}

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Directory the dataset file is written to.
    pub output_dir: PathBuf,
    /// Categories to generate, in catalog order. Empty means all.
    pub categories: Vec<Category>,
    pub backends: Vec<BackendShare>,
    /// Generated prompts requested per category per round.
    pub target_per_category: usize,
    /// Records (seeds included) a category needs to meet its minimum.
    pub min_per_category: usize,
    /// Prompts per backend call on the first round.
    pub batch_size: usize,
    /// Ceiling on the widened batch size of retry rounds.
    pub max_batch_size: usize,
    /// Fraction of each chunk requested as forking prompts.
    pub forking_ratio: f64,
    /// Extra rounds after the first when a category is short.
    pub category_retries: u32,
    /// Target multiplier for hard categories.
    pub hard_target_multiplier: f64,
    /// Share added per retry round to high-capability backends for hard categories.
    pub high_capability_boost: f64,
    /// Structured-output calls per batch before giving up on it.
    pub parse_attempts: u32,
    /// Attempts per backend call, transient errors only.
    pub backend_attempts: u32,
    /// Delay before the first backend retry, doubled per retry.
    pub retry_base_delay_ms: u64,
    /// Fixed RNG seed for reproducible seed-example sampling.
    pub seed: Option<u64>,
    /// Apply the length/terminal/ellipsis gate to traditional prompts.
    pub quality_gate: bool,
    /// Write the Prometheus text dump here after the run.
    pub metrics_path: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./generated-datasets"),
            categories: Vec::new(),
            backends: vec![
                BackendShare::new("openai/gpt-4.1", 0.7),
                BackendShare::new("openai/gpt-4.5-preview", 0.3).high_capability(),
            ],
            target_per_category: 335,
            min_per_category: 300,
            batch_size: 8,
            max_batch_size: 18,
            forking_ratio: 0.5,
            category_retries: 1,
            hard_target_multiplier: 1.5,
            high_capability_boost: 0.1,
            parse_attempts: 2,
            backend_attempts: 3,
            retry_base_delay_ms: 1000,
            seed: None,
            quality_gate: true,
            metrics_path: None,
        }
    }
}

impl GenerationConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a YAML file on top of the defaults.
    ///
    /// Keys absent from the file keep their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Yaml` if it does not match the schema.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Creates configuration from the defaults plus environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FORKGEN_OUTPUT_DIR`: Output directory (default: ./generated-datasets)
    /// - `FORKGEN_CATEGORIES`: Comma-separated category names
    /// - `FORKGEN_BACKENDS`: Comma-separated `model=share[:high]` entries
    /// - `FORKGEN_TARGET`: Prompts per category per round (default: 335)
    /// - `FORKGEN_MINIMUM`: Minimum records per category (default: 300)
    /// - `FORKGEN_BATCH_SIZE`: First-round batch size (default: 8)
    /// - `FORKGEN_MAX_BATCH_SIZE`: Batch size ceiling (default: 18)
    /// - `FORKGEN_FORKING_RATIO`: Forking fraction (default: 0.5)
    /// - `FORKGEN_CATEGORY_RETRIES`: Extra rounds (default: 1)
    /// - `FORKGEN_PARSE_ATTEMPTS`: JSON attempts per batch (default: 2)
    /// - `FORKGEN_BACKEND_ATTEMPTS`: Attempts per backend call (default: 3)
    /// - `FORKGEN_RETRY_BASE_DELAY_MS`: First backoff delay (default: 1000)
    /// - `FORKGEN_SEED`: RNG seed
    /// - `FORKGEN_QUALITY_GATE`: Enable the quality gate (default: true)
    /// - `FORKGEN_METRICS_PATH`: Metrics dump path
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value or the
    /// result fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().with_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `FORKGEN_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("FORKGEN_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("FORKGEN_CATEGORIES") {
            self.categories = parse_categories(&val, "FORKGEN_CATEGORIES")?;
        }

        if let Some(val) = lookup("FORKGEN_BACKENDS") {
            self.backends = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(BackendShare::parse)
                .collect::<Result<_, _>>()?;
        }

        if let Some(val) = lookup("FORKGEN_TARGET") {
            self.target_per_category = parse_env_value(&val, "FORKGEN_TARGET")?;
        }

        if let Some(val) = lookup("FORKGEN_MINIMUM") {
            self.min_per_category = parse_env_value(&val, "FORKGEN_MINIMUM")?;
        }

        if let Some(val) = lookup("FORKGEN_BATCH_SIZE") {
            self.batch_size = parse_env_value(&val, "FORKGEN_BATCH_SIZE")?;
        }

        if let Some(val) = lookup("FORKGEN_MAX_BATCH_SIZE") {
            self.max_batch_size = parse_env_value(&val, "FORKGEN_MAX_BATCH_SIZE")?;
        }

        if let Some(val) = lookup("FORKGEN_FORKING_RATIO") {
            self.forking_ratio = parse_env_value(&val, "FORKGEN_FORKING_RATIO")?;
        }

        if let Some(val) = lookup("FORKGEN_CATEGORY_RETRIES") {
            self.category_retries = parse_env_value(&val, "FORKGEN_CATEGORY_RETRIES")?;
        }

        if let Some(val) = lookup("FORKGEN_PARSE_ATTEMPTS") {
            self.parse_attempts = parse_env_value(&val, "FORKGEN_PARSE_ATTEMPTS")?;
        }

        if let Some(val) = lookup("FORKGEN_BACKEND_ATTEMPTS") {
            self.backend_attempts = parse_env_value(&val, "FORKGEN_BACKEND_ATTEMPTS")?;
        }

        if let Some(val) = lookup("FORKGEN_RETRY_BASE_DELAY_MS") {
            self.retry_base_delay_ms = parse_env_value(&val, "FORKGEN_RETRY_BASE_DELAY_MS")?;
        }

        if let Some(val) = lookup("FORKGEN_SEED") {
            self.seed = Some(parse_env_value(&val, "FORKGEN_SEED")?);
        }

        if let Some(val) = lookup("FORKGEN_QUALITY_GATE") {
            self.quality_gate = parse_env_bool(&val, "FORKGEN_QUALITY_GATE")?;
        }

        if let Some(val) = lookup("FORKGEN_METRICS_PATH") {
            self.metrics_path = Some(PathBuf::from(val));
        }

        Ok(self)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backends.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "at least one backend is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for backend in &self.backends {
            if backend.model.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "backend model cannot be empty".to_string(),
                ));
            }
            if !(backend.share > 0.0 && backend.share <= 1.0) {
                return Err(ConfigError::ValidationFailed(format!(
                    "backend share for '{}' must be in (0, 1]",
                    backend.model
                )));
            }
            if !seen.insert(backend.model.as_str()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "backend '{}' listed more than once",
                    backend.model
                )));
            }
        }

        let total_share: f64 = self.backends.iter().map(|b| b.share).sum();
        if (total_share - 1.0).abs() > 0.01 {
            return Err(ConfigError::ValidationFailed(format!(
                "backend shares must sum to 1.0, got {:.2}",
                total_share
            )));
        }

        if self.target_per_category == 0 {
            return Err(ConfigError::ValidationFailed(
                "target_per_category must be greater than 0".to_string(),
            ));
        }

        if self.min_per_category > self.target_per_category {
            return Err(ConfigError::ValidationFailed(
                "min_per_category cannot exceed target_per_category".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if self.max_batch_size < self.batch_size {
            return Err(ConfigError::ValidationFailed(
                "max_batch_size cannot be smaller than batch_size".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.forking_ratio) {
            return Err(ConfigError::ValidationFailed(
                "forking_ratio must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.hard_target_multiplier < 1.0 {
            return Err(ConfigError::ValidationFailed(
                "hard_target_multiplier must be at least 1.0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.high_capability_boost) {
            return Err(ConfigError::ValidationFailed(
                "high_capability_boost must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.parse_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "parse_attempts must be greater than 0".to_string(),
            ));
        }

        if self.backend_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "backend_attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Categories to run, in catalog order, duplicates removed.
    pub fn selected_categories(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            return Category::all();
        }
        Category::all()
            .into_iter()
            .filter(|c| self.categories.contains(c))
            .collect()
    }

    /// Per-round target for a category.
    pub fn target_for(&self, definition: &CategoryDefinition) -> usize {
        if definition.hard {
            (self.target_per_category as f64 * self.hard_target_multiplier) as usize
        } else {
            self.target_per_category
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_backends(mut self, backends: Vec<BackendShare>) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target_per_category = target;
        self
    }

    pub fn with_minimum(mut self, minimum: usize) -> Self {
        self.min_per_category = minimum;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    pub fn with_forking_ratio(mut self, ratio: f64) -> Self {
        self.forking_ratio = ratio;
        self
    }

    pub fn with_category_retries(mut self, retries: u32) -> Self {
        self.category_retries = retries;
        self
    }

    pub fn with_parse_attempts(mut self, attempts: u32) -> Self {
        self.parse_attempts = attempts;
        self
    }

    pub fn with_backend_attempts(mut self, attempts: u32) -> Self {
        self.backend_attempts = attempts;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_quality_gate(mut self, enabled: bool) -> Self {
        self.quality_gate = enabled;
        self
    }

    pub fn with_metrics_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }
}

fn parse_categories(value: &str, key: &str) -> Result<Vec<Category>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            name.parse::<Category>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        })
        .collect()
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}
