//! Metrics collection and exposition.
//!
//! # Metrics
//! - `signaling_requests_total` (counter): requests by operation, status
//! - `signaling_request_duration_seconds` (histogram): handler latency by operation
//! - `signaling_sessions_created_total` (counter)
//! - `signaling_sessions_closed_total` (counter): by reason (client, peer, shutdown)
//! - `signaling_sessions_live` (gauge)
//! - `signaling_candidates_delivered_total` (counter)
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Prometheus exporter is opt-in via config

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled signaling request.
pub fn record_request(operation: &'static str, status: u16, start: Instant) {
    counter!(
        "signaling_requests_total",
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("signaling_request_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_session_created() {
    counter!("signaling_sessions_created_total").increment(1);
    gauge!("signaling_sessions_live").increment(1.0);
}

pub fn record_session_closed(reason: &'static str) {
    counter!("signaling_sessions_closed_total", "reason" => reason).increment(1);
    gauge!("signaling_sessions_live").decrement(1.0);
}

pub fn record_sessions_drained(closed: usize) {
    counter!("signaling_sessions_closed_total", "reason" => "shutdown").increment(closed as u64);
    gauge!("signaling_sessions_live").decrement(closed as f64);
}

pub fn record_candidates_delivered(count: usize) {
    counter!("signaling_candidates_delivered_total").increment(count as u64);
}
