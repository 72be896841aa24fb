//! Metrics module for Prometheus-based monitoring.
//!
//! Tracks backend calls, validation outcomes and per-category totals. A
//! generation run can dump the registry in text format when it finishes.
//!
//! # Example
//!
//! ```
//! use forkgen::metrics::{export_metrics, init_metrics, MetricsCollector};
//!
//! init_metrics().expect("metrics register");
//! let collector = MetricsCollector::new();
//! collector.record_category(forkgen::categories::Category::FactualRecall, 5, 330, true);
//!
//! let text = export_metrics();
//! assert!(text.contains("forkgen_category_records"));
//! ```

pub mod collectors;
pub mod prometheus;

pub use collectors::{MetricsCollector, TokenUsage};
pub use prometheus::{export_metrics, init_metrics};

pub use prometheus::{
    BACKEND_LATENCY, BACKEND_REQUESTS_TOTAL, BACKEND_TOKENS_TOTAL, CANDIDATES_TOTAL,
    CATEGORY_RECORDS, CATEGORY_SHORTFALLS_TOTAL, PARSE_FAILURES_TOTAL, REGISTRY,
};
