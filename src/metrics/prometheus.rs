//! Prometheus metrics registration and export.
//!
//! This module defines all Prometheus metrics used by forkgen and provides
//! functions for initializing, registering, and exporting metrics.

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all forkgen metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Backend call attempts, labeled by model and status.
pub static BACKEND_REQUESTS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Backend call latency in seconds, labeled by model.
pub static BACKEND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Tokens used, labeled by model and type (input/output).
pub static BACKEND_TOKENS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Validated candidates, labeled by category, variant and outcome.
pub static CANDIDATES_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Responses that yielded no candidates, labeled by category and variant.
pub static PARSE_FAILURES_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Records per category after aggregation, labeled by category and source.
pub static CATEGORY_RECORDS: OnceLock<GaugeVec> = OnceLock::new();

/// Categories that finished below their minimum, labeled by category.
pub static CATEGORY_SHORTFALLS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Initialize all metrics and register them with the registry.
///
/// Call once at startup; later calls leave the first registry in place.
///
/// # Errors
///
/// Returns a `prometheus::Error` if metric registration fails, typically due to
/// duplicate metric names or invalid metric configurations.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    let backend_requests_total = CounterVec::new(
        Opts::new("forkgen_backend_requests_total", "Backend call attempts"),
        &["model", "status"],
    )?;

    let backend_latency = HistogramVec::new(
        HistogramOpts::new(
            "forkgen_backend_latency_seconds",
            "Backend call latency in seconds",
        )
        .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["model"],
    )?;

    let backend_tokens_total = CounterVec::new(
        Opts::new("forkgen_backend_tokens_total", "Total tokens used"),
        &["model", "type"],
    )?;

    let candidates_total = CounterVec::new(
        Opts::new("forkgen_candidates_total", "Validated candidate records"),
        &["category", "variant", "outcome"],
    )?;

    let parse_failures_total = CounterVec::new(
        Opts::new(
            "forkgen_parse_failures_total",
            "Backend responses that yielded no candidates",
        ),
        &["category", "variant"],
    )?;

    let category_records = GaugeVec::new(
        Opts::new("forkgen_category_records", "Records per category"),
        &["category", "source"],
    )?;

    let category_shortfalls_total = CounterVec::new(
        Opts::new(
            "forkgen_category_shortfalls_total",
            "Categories that finished below their minimum",
        ),
        &["category"],
    )?;

    registry.register(Box::new(backend_requests_total.clone()))?;
    registry.register(Box::new(backend_latency.clone()))?;
    registry.register(Box::new(backend_tokens_total.clone()))?;
    registry.register(Box::new(candidates_total.clone()))?;
    registry.register(Box::new(parse_failures_total.clone()))?;
    registry.register(Box::new(category_records.clone()))?;
    registry.register(Box::new(category_shortfalls_total.clone()))?;

    // If any of these fail, metrics were already initialized (idempotent)
    let _ = REGISTRY.set(registry);
    let _ = BACKEND_REQUESTS_TOTAL.set(backend_requests_total);
    let _ = BACKEND_LATENCY.set(backend_latency);
    let _ = BACKEND_TOKENS_TOTAL.set(backend_tokens_total);
    let _ = CANDIDATES_TOTAL.set(candidates_total);
    let _ = PARSE_FAILURES_TOTAL.set(parse_failures_total);
    let _ = CATEGORY_RECORDS.set(category_records);
    let _ = CATEGORY_SHORTFALLS_TOTAL.set(category_shortfalls_total);

    tracing::debug!("Prometheus metrics initialized");

    Ok(())
}

/// Export all registered metrics in Prometheus text format.
///
/// Returns a comment line instead when the registry is not initialized or
/// encoding fails.
pub fn export_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return "# Metrics not initialized. Call init_metrics() first.\n".to_string();
    };

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}\n", e);
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|e| format!("# Error converting metrics to UTF-8: {}\n", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics() {
        let result = init_metrics();
        assert!(result.is_ok() || REGISTRY.get().is_some());
    }

    #[test]
    fn test_metrics_after_init() {
        let _ = init_metrics();

        if let Some(candidates) = CANDIDATES_TOTAL.get() {
            candidates
                .with_label_values(&["factual_recall", "traditional", "accepted"])
                .inc();
        }

        let metrics = export_metrics();
        assert!(!metrics.starts_with("# Error"));
        assert!(metrics.contains("forkgen_candidates_total"));
    }
}
