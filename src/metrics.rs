//! Prometheus metrics for upstream call tracking.
//!
//! Every route is one upstream round trip (or a short fixed sequence), so
//! the interesting numbers are per-operation call counts, failures, and
//! latency, plus how many advisory checks each aggregation pass skipped.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Upstream call latency metric name.
pub const METRIC_UPSTREAM_LATENCY: &str = "upstream_call_latency_ms";
/// Upstream calls counter metric name.
pub const METRIC_UPSTREAM_CALLS: &str = "upstream_calls_total";
/// Upstream failures counter metric name.
pub const METRIC_UPSTREAM_FAILURES: &str = "upstream_failures_total";
/// Skipped advisory checks counter metric name.
pub const METRIC_ADVISOR_CHECKS_SKIPPED: &str = "advisor_checks_skipped_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_UPSTREAM_LATENCY,
        "Upstream API call latency in milliseconds"
    );
    describe_counter!(METRIC_UPSTREAM_CALLS, "Total number of upstream API calls");
    describe_counter!(
        METRIC_UPSTREAM_FAILURES,
        "Total number of failed upstream API calls"
    );
    describe_counter!(
        METRIC_ADVISOR_CHECKS_SKIPPED,
        "Total number of advisory checks skipped during aggregation"
    );

    debug!("Metrics initialized");
}

/// Record upstream call latency for the given operation.
pub fn record_upstream_latency(start: Instant, operation: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_UPSTREAM_LATENCY, "operation" => operation).record(latency_ms);
}

/// Increment the upstream calls counter for the given operation.
pub fn inc_upstream_calls(operation: &'static str) {
    counter!(METRIC_UPSTREAM_CALLS, "operation" => operation).increment(1);
}

/// Increment the upstream failures counter for the given operation.
pub fn inc_upstream_failures(operation: &'static str) {
    counter!(METRIC_UPSTREAM_FAILURES, "operation" => operation).increment(1);
}

/// Increment the skipped advisory checks counter.
pub fn inc_advisor_checks_skipped() {
    counter!(METRIC_ADVISOR_CHECKS_SKIPPED).increment(1);
}
