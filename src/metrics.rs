//! Prometheus metrics for relay observability.
//!
//! Metrics are exposed via a dedicated HTTP listener (default port: 9090,
//! `METRICS_PORT=0` disables it).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `capi_events_received_total` - Inbound tracking requests accepted for relay
//! - `capi_events_relayed_total` - Relay outcomes (label: outcome = delivered | rejected | failed)
//! - `capi_invalid_requests_total` - Requests rejected before relaying (label: reason)
//!
//! ## Histograms
//! - `capi_relay_duration_seconds` - Outbound Conversions API call duration (label: status)

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const EVENTS_RECEIVED_TOTAL: &str = "capi_events_received_total";
    pub const EVENTS_RELAYED_TOTAL: &str = "capi_events_relayed_total";
    pub const INVALID_REQUESTS_TOTAL: &str = "capi_invalid_requests_total";
    pub const RELAY_DURATION_SECONDS: &str = "capi_relay_duration_seconds";
}

/// Relay outcome labels.
pub mod outcomes {
    /// Upstream accepted the event
    pub const DELIVERED: &str = "delivered";
    /// Upstream answered with a non-success status
    pub const REJECTED: &str = "rejected";
    /// The outbound call itself failed
    pub const FAILED: &str = "failed";
}

/// Initialize the Prometheus metrics exporter.
///
/// Sets up metric descriptions and starts the Prometheus HTTP listener on
/// the given address.
///
/// # Errors
///
/// Returns an error message if the exporter cannot be installed
/// (e.g., the port is already bound).
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::EVENTS_RECEIVED_TOTAL,
        "Total inbound tracking requests accepted for relaying"
    );
    describe_counter!(
        names::EVENTS_RELAYED_TOTAL,
        "Total relay outcomes by result (delivered, rejected, failed)"
    );
    describe_counter!(
        names::INVALID_REQUESTS_TOTAL,
        "Total requests rejected before relaying (bad method, bad JSON, missing config)"
    );
    describe_histogram!(
        names::RELAY_DURATION_SECONDS,
        "Outbound Conversions API call duration in seconds"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
///
/// Metrics are optional; a relay that cannot export them still relays.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record an inbound tracking request accepted for relay.
pub fn record_event_received() {
    counter!(names::EVENTS_RECEIVED_TOTAL).increment(1);
}

/// Record a relay outcome (see [`outcomes`]).
pub fn record_relay_outcome(outcome: &'static str) {
    counter!(names::EVENTS_RELAYED_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a request rejected before relaying.
pub fn record_invalid_request(reason: &'static str) {
    counter!(names::INVALID_REQUESTS_TOTAL, "reason" => reason).increment(1);
}

/// Record the duration of an outbound Conversions API call.
pub fn record_relay_duration(status: &str, duration_secs: f64) {
    histogram!(names::RELAY_DURATION_SECONDS, "status" => status.to_string())
        .record(duration_secs);
}
