//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by action and rule
//! - `edge_request_duration_seconds` (histogram): latency distribution
//! - `edge_upstream_errors_total` (counter): renderer connection failures
//! - `edge_redirection_entries` (gauge): size of the redirection table
//! - `edge_redirection_refresh_total` (counter): refreshes by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(action: &'static str, rule: &'static str, status: u16, start: Instant) {
    counter!(
        "edge_requests_total",
        "action" => action,
        "rule" => rule,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("edge_request_duration_seconds", "action" => action)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error() {
    counter!("edge_upstream_errors_total").increment(1);
}

pub fn record_redirection_entries(count: usize) {
    gauge!("edge_redirection_entries").set(count as f64);
}

/// `outcome` is one of "updated", "unchanged", "failed".
pub fn record_redirection_refresh(outcome: &'static str) {
    counter!("edge_redirection_refresh_total", "outcome" => outcome).increment(1);
}
