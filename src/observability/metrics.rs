//! Metrics collection and exposition.
//!
//! # Metrics
//! - `siteguard_requests_total` (counter): forwarded requests by method, status
//! - `siteguard_blocked_total` (counter): gate rejections by stage

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and start the scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "Metrics endpoint started");
            metrics::describe_counter!(
                "siteguard_requests_total",
                "Requests passed through the gateway, by method and status"
            );
            metrics::describe_counter!(
                "siteguard_blocked_total",
                "Requests rejected by a detection gate, by stage"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

/// Record one forwarded request.
pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "siteguard_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Record one rejection by the request or response gate.
pub fn record_blocked(stage: &'static str) {
    metrics::counter!("siteguard_blocked_total", "stage" => stage).increment(1);
}
