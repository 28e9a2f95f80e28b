//! Health and readiness endpoints.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check; always 200, reports configuration state
//! - `GET /ready` - Readiness probe; 503 until upstream credentials are set
//!
//! The relay holds no connections open to the Conversions API, so
//! "ready" means "configured": a pod without credentials can only answer
//! 500 on the tracking endpoint and should not receive traffic.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// Always returns 200 OK with status details in the body.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "healthy",
///   "upstream_configured": true,
///   "version": "0.1.0",
///   "timestamp": "2024-01-15T10:30:00Z"
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let upstream_configured = state.config.upstream_configured();

    Json(HealthResponse {
        status: if upstream_configured {
            "healthy"
        } else {
            "degraded"
        }
        .to_string(),
        upstream_configured,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Readiness check endpoint for orchestrator probes.
///
/// Returns 200 OK once upstream credentials are configured,
/// 503 Service Unavailable otherwise.
#[instrument(skip(state))]
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    if state.config.upstream_configured() {
        Ok(StatusCode::OK)
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
