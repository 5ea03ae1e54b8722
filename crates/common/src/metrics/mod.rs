//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all CiteGraph metrics
pub const METRICS_PREFIX: &str = "citegraph";

/// Histogram buckets for graph-build latency (network-bound, in seconds)
pub const BUILD_BUCKETS: &[f64] = &[
    0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Source adapter metrics
    describe_counter!(
        format!("{}_source_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total outbound bibliographic source requests"
    );

    describe_counter!(
        format!("{}_source_retries_total", METRICS_PREFIX),
        Unit::Count,
        "Total retried source requests"
    );

    describe_counter!(
        format!("{}_source_giveups_total", METRICS_PREFIX),
        Unit::Count,
        "Source requests degraded to absence after retry exhaustion"
    );

    // Build metrics
    describe_counter!(
        format!("{}_graph_builds_total", METRICS_PREFIX),
        Unit::Count,
        "Total graph build operations"
    );

    describe_histogram!(
        format!("{}_graph_build_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Graph build latency in seconds"
    );

    describe_gauge!(
        format!("{}_graphs_registered", METRICS_PREFIX),
        Unit::Count,
        "Graphs currently held in the registry"
    );

    // Clustering metrics
    describe_counter!(
        format!("{}_clustering_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Total clustering operations"
    );

    describe_histogram!(
        format!("{}_clustering_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Clustering latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record an outbound source request
pub fn record_source_request(operation: &str, outcome: &str) {
    counter!(
        format!("{}_source_requests_total", METRICS_PREFIX),
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a retry of a transiently failing source request
pub fn record_source_retry(operation: &str) {
    counter!(
        format!("{}_source_retries_total", METRICS_PREFIX),
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a source request that degraded to absence after retries
pub fn record_source_giveup(operation: &str) {
    counter!(
        format!("{}_source_giveups_total", METRICS_PREFIX),
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a completed graph build
pub fn record_build(duration_secs: f64, node_count: usize, edge_count: usize) {
    counter!(format!("{}_graph_builds_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_graph_build_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    tracing::debug!(
        duration_secs,
        node_count,
        edge_count,
        "Build metrics recorded"
    );
}

/// Record the current registry size
pub fn record_registry_size(count: usize) {
    gauge!(format!("{}_graphs_registered", METRICS_PREFIX)).set(count as f64);
}

/// Record a clustering run
pub fn record_clustering(duration_secs: f64, method: &str, n_clusters: usize) {
    counter!(
        format!("{}_clustering_runs_total", METRICS_PREFIX),
        "method" => method.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_clustering_duration_seconds", METRICS_PREFIX),
        "method" => method.to_string()
    )
    .record(duration_secs);

    tracing::debug!(method, n_clusters, "Clustering metrics recorded");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in BUILD_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("POST", "/v1/graphs/build");
        metrics.finish(200);
        // Just verify it runs without panic
    }
}
