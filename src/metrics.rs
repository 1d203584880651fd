//! Prometheus metrics for upstream latency and enrichment outcomes.
//!
//! This module provides metrics for:
//! - Upstream request latency, per upstream
//! - Upstream failures, per upstream and failure kind
//! - Country metadata enrichment results

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{debug, info};

use crate::error::AppError;
use crate::upstream::Upstream;

// === Metric Name Constants ===

/// Upstream request latency metric name.
pub const METRIC_UPSTREAM_LATENCY: &str = "upstream_request_latency_ms";
/// Upstream errors counter metric name.
pub const METRIC_UPSTREAM_ERRORS: &str = "upstream_errors_total";
/// Country metadata failures counter metric name.
pub const METRIC_COUNTRY_METADATA_FAILURES: &str = "country_metadata_failures_total";
/// Enriched occurrence records counter metric name.
pub const METRIC_COUNTRY_RECORDS_ENRICHED: &str = "country_records_enriched_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_UPSTREAM_LATENCY,
        "Upstream request latency in milliseconds"
    );

    describe_counter!(
        METRIC_UPSTREAM_ERRORS,
        "Total number of failed upstream requests"
    );
    describe_counter!(
        METRIC_COUNTRY_METADATA_FAILURES,
        "Total number of occurrence records left without country metadata"
    );
    describe_counter!(
        METRIC_COUNTRY_RECORDS_ENRICHED,
        "Total number of occurrence records enriched with country metadata"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter with its own HTTP listener.
pub fn install_exporter(port: u16) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| AppError::Metrics(e.to_string()))?;

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Record upstream request latency.
pub fn record_upstream_latency(start: Instant, upstream: Upstream) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    let label: &'static str = upstream.into();
    histogram!(METRIC_UPSTREAM_LATENCY, "upstream" => label).record(latency_ms);
}

/// Increment upstream errors counter.
pub fn inc_upstream_errors(upstream: Upstream, kind: &'static str) {
    let label: &'static str = upstream.into();
    counter!(METRIC_UPSTREAM_ERRORS, "upstream" => label, "kind" => kind).increment(1);
}

/// Add to the country metadata failures counter.
pub fn inc_country_metadata_failures(count: u64) {
    counter!(METRIC_COUNTRY_METADATA_FAILURES).increment(count);
}

/// Add to the enriched records counter.
pub fn inc_country_records_enriched(count: u64) {
    counter!(METRIC_COUNTRY_RECORDS_ENRICHED).increment(count);
}

/// RAII guard for timing upstream calls.
/// Automatically records latency when dropped.
pub struct UpstreamTimer {
    start: Instant,
    upstream: Upstream,
}

impl UpstreamTimer {
    /// Create a new latency timer for the given upstream.
    pub fn new(upstream: Upstream) -> Self {
        Self {
            start: Instant::now(),
            upstream,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for UpstreamTimer {
    fn drop(&mut self) {
        record_upstream_latency(self.start, self.upstream);
    }
}

/// Create a latency timer for an upstream request.
pub fn timer_upstream(upstream: Upstream) -> UpstreamTimer {
    UpstreamTimer::new(upstream)
}
