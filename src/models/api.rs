use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-facing acknowledgment for a completed upstream exchange.
///
/// Emitted with HTTP 200 when the upstream reported success and 500
/// otherwise; `meta` echoes the upstream's own JSON body either way so the
/// caller can diagnose rejections (bad token, malformed match data).
#[derive(Debug, Serialize, Deserialize)]
pub struct RelayResponse {
    /// Whether the upstream accepted the event
    pub ok: bool,
    /// Upstream response body, verbatim
    pub meta: serde_json::Value,
    /// The event identifier that was relayed (client-supplied or generated)
    pub event_id: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status
    pub status: String,
    /// Whether upstream credentials are configured
    pub upstream_configured: bool,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
}
