//! Prometheus metrics for provider latency and scan outcomes.
//!
//! This module provides:
//! - Provider request latency and error counts
//! - Scan latency
//! - Per-match evaluation and skip counts
//! - Detected opportunity counts

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{debug, warn};

// === Metric Name Constants ===

/// Provider request latency metric name.
pub const METRIC_PROVIDER_REQUEST_LATENCY: &str = "provider_request_latency_ms";
/// Scan latency metric name.
pub const METRIC_SCAN_LATENCY: &str = "scan_latency_ms";
/// Matches evaluated counter metric name.
pub const METRIC_MATCHES_EVALUATED: &str = "matches_evaluated_total";
/// Matches skipped counter metric name.
pub const METRIC_MATCHES_SKIPPED: &str = "matches_skipped_total";
/// Opportunities detected counter metric name.
pub const METRIC_OPPORTUNITIES_DETECTED: &str = "opportunities_detected_total";
/// Provider errors counter metric name.
pub const METRIC_PROVIDER_ERRORS: &str = "provider_errors_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_PROVIDER_REQUEST_LATENCY,
        "Odds provider request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_SCAN_LATENCY,
        "Time to evaluate one batch of matches in milliseconds"
    );

    describe_counter!(
        METRIC_MATCHES_EVALUATED,
        "Total number of matches passed to the evaluator"
    );
    describe_counter!(
        METRIC_MATCHES_SKIPPED,
        "Total number of matches skipped as ineligible, by reason"
    );
    describe_counter!(
        METRIC_OPPORTUNITIES_DETECTED,
        "Total number of arbitrage opportunities detected"
    );
    describe_counter!(
        METRIC_PROVIDER_ERRORS,
        "Total number of odds provider failures, by kind"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and describe metrics.
///
/// Returns `None` if a recorder is already installed.
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            init_metrics();
            Some(handle)
        }
        Err(e) => {
            warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

/// Record provider request latency.
pub fn record_provider_latency(start: Instant, endpoint: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_PROVIDER_REQUEST_LATENCY, "endpoint" => endpoint).record(latency_ms);
}

/// Increment matches evaluated counter.
pub fn inc_matches_evaluated() {
    counter!(METRIC_MATCHES_EVALUATED).increment(1);
}

/// Increment matches skipped counter.
pub fn inc_matches_skipped(reason: &'static str) {
    counter!(METRIC_MATCHES_SKIPPED, "reason" => reason).increment(1);
}

/// Increment opportunities detected counter.
pub fn inc_opportunities_detected(count: u64) {
    counter!(METRIC_OPPORTUNITIES_DETECTED).increment(count);
}

/// Increment provider errors counter.
pub fn inc_provider_errors(kind: &'static str) {
    counter!(METRIC_PROVIDER_ERRORS, "kind" => kind).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for a scan pass.
pub fn timer_scan() -> LatencyTimer {
    LatencyTimer::new(METRIC_SCAN_LATENCY)
}
