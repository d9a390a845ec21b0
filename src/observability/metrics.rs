//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_guid_resolutions_total` (counter): GUID outcomes
//! - `gateway_internal_rewrites_total` (counter): proxy re-dispatches
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op (tests, embedding)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::guid::{Resolution, ResolveError};

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a GUID resolution.
pub fn record_resolution(outcome: &Result<Resolution, ResolveError>) {
    let label = match outcome {
        Ok(Resolution::Redirect(_)) => "redirect",
        Ok(Resolution::Proxy(_)) => "proxy",
        Err(ResolveError::NotFound { .. }) => "not_found",
    };
    counter!("gateway_guid_resolutions_total", "outcome" => label).increment(1);
}

/// Record one internal rewrite hop.
pub fn record_rewrite() {
    counter!("gateway_internal_rewrites_total").increment(1);
}
