//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by method, status
//! - `dispatch_request_duration_seconds` (histogram): latency by method
//! - `dispatch_negotiation_failures_total` (counter): failed inspections by reason
//! - `dispatch_executors_registered` (counter): executors compiled, by method
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels stay low-cardinality: no paths, no content types

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Installs the Prometheus recorder with a scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "dispatch_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "dispatch_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_negotiation_failure(reason: &'static str) {
    ::metrics::counter!("dispatch_negotiation_failures_total", "reason" => reason).increment(1);
}

pub fn record_executor_registered(method: &str) {
    ::metrics::counter!("dispatch_executors_registered", "method" => method.to_string())
        .increment(1);
}
