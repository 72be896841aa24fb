//! High-level metric recording for the generation pipeline.
//!
//! `MetricsCollector` wraps the raw Prometheus metrics with consistent
//! labels. Every method is a no-op until [`init_metrics`](super::init_metrics)
//! has run, so library code can record unconditionally.

use super::prometheus::{
    BACKEND_LATENCY, BACKEND_REQUESTS_TOTAL, BACKEND_TOKENS_TOTAL, CANDIDATES_TOTAL,
    CATEGORY_RECORDS, CATEGORY_SHORTFALLS_TOTAL, PARSE_FAILURES_TOTAL,
};
use crate::categories::Category;
use crate::dataset::VariantKind;

/// Token usage information for backend requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Number of input/prompt tokens.
    pub input_tokens: u64,
    /// Number of output/completion tokens.
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Metrics collector for recording forkgen operational metrics.
///
/// # Example
///
/// ```
/// use forkgen::categories::Category;
/// use forkgen::dataset::VariantKind;
/// use forkgen::metrics::{init_metrics, MetricsCollector, TokenUsage};
///
/// init_metrics().expect("metrics register");
/// let collector = MetricsCollector::new();
///
/// collector.record_backend_request("openai/gpt-4.1", "success", 2.5, TokenUsage::new(900, 1400));
/// collector.record_candidate(Category::Counterfactual, VariantKind::Forking, true);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    /// Record one backend call attempt.
    ///
    /// # Arguments
    ///
    /// * `model` - Backend model identifier
    /// * `status` - `"success"` or a failure kind such as `"timeout"`
    /// * `latency_secs` - Wall time of the attempt
    /// * `tokens` - Token usage reported by the backend
    pub fn record_backend_request(
        &self,
        model: &str,
        status: &str,
        latency_secs: f64,
        tokens: TokenUsage,
    ) {
        if let Some(requests) = BACKEND_REQUESTS_TOTAL.get() {
            requests.with_label_values(&[model, status]).inc();
        }

        if let Some(latency) = BACKEND_LATENCY.get() {
            latency.with_label_values(&[model]).observe(latency_secs);
        }

        if let Some(token_counter) = BACKEND_TOKENS_TOTAL.get() {
            token_counter
                .with_label_values(&[model, "input"])
                .inc_by(tokens.input_tokens as f64);
            token_counter
                .with_label_values(&[model, "output"])
                .inc_by(tokens.output_tokens as f64);
        }

        tracing::trace!(
            model = model,
            status = status,
            latency_secs = latency_secs,
            total_tokens = tokens.total(),
            "Recorded backend request metric"
        );
    }

    /// Record the validation outcome of one candidate.
    pub fn record_candidate(&self, category: Category, variant: VariantKind, accepted: bool) {
        let outcome = if accepted { "accepted" } else { "rejected" };
        if let Some(candidates) = CANDIDATES_TOTAL.get() {
            candidates
                .with_label_values(&[category.as_str(), variant.as_str(), outcome])
                .inc();
        }
    }

    /// Record a batch whose response produced no candidates.
    pub fn record_parse_failure(&self, category: Category, variant: VariantKind) {
        if let Some(failures) = PARSE_FAILURES_TOTAL.get() {
            failures
                .with_label_values(&[category.as_str(), variant.as_str()])
                .inc();
        }
    }

    /// Record the final size of a category.
    ///
    /// # Arguments
    ///
    /// * `category` - The aggregated category
    /// * `seeds` - Seed records included
    /// * `generated` - Validated generated records
    /// * `meets_minimum` - Whether the category reached its minimum
    pub fn record_category(
        &self,
        category: Category,
        seeds: usize,
        generated: usize,
        meets_minimum: bool,
    ) {
        if let Some(records) = CATEGORY_RECORDS.get() {
            records
                .with_label_values(&[category.as_str(), "seed"])
                .set(seeds as f64);
            records
                .with_label_values(&[category.as_str(), "generated"])
                .set(generated as f64);
        }

        if !meets_minimum {
            if let Some(shortfalls) = CATEGORY_SHORTFALLS_TOTAL.get() {
                shortfalls.with_label_values(&[category.as_str()]).inc();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{export_metrics, init_metrics};

    #[test]
    fn test_token_usage() {
        let usage = TokenUsage::new(100, 50);
        assert_eq!(usage.total(), 150);
        assert_eq!(TokenUsage::default().total(), 0);
    }

    #[test]
    fn test_recording_without_init_does_not_panic() {
        let collector = MetricsCollector::new();
        collector.record_backend_request("m", "timeout", 0.1, TokenUsage::default());
        collector.record_parse_failure(Category::FactualRecall, VariantKind::Forking);
    }

    #[test]
    fn test_category_shortfall_is_exported() {
        let _ = init_metrics();
        let collector = MetricsCollector::new();
        collector.record_category(Category::TheoryOfMind, 5, 120, false);

        let text = export_metrics();
        assert!(text.contains("forkgen_category_shortfalls_total"));
        assert!(text.contains("theory_of_mind"));
    }
}
