//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (request path, outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │  Rate Limiting   │ ← 429 if exceeded (only when enabled)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Generates and propagates X-Request-Id
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  CORS + BodyCap  │ ← Browser cross-origin headers, body size limit
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler
//! ```
//!
//! # Routes
//!
//! - `POST /events` - Tracking event relay (any other method answers 405)
//! - `GET /health`, `GET /ready` - Health & readiness

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::{RateLimitError, RateLimitLayer};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
///
/// # Middleware Configuration
///
/// - **Rate Limiting**: enabled if `rate_limit_rps > 0`
/// - **CORS**: configured from `cors_allowed_origins`
/// - **Body limit**: `max_request_body_size`
///
/// # Errors
///
/// Returns `RateLimitError` if the rate limiting configuration is invalid.
pub fn build_router(state: AppState) -> Result<Router, RateLimitError> {
    let config = &state.config;

    let cors = build_cors_layer(&config.cors_allowed_origins);

    let mut router = Router::new()
        // Health and status endpoints
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // The tracking endpoint; the fallback answers 405 with the
        // documented plain-text body for every non-POST method
        .route(
            "/events",
            post(handlers::track_event).fallback(handlers::method_not_allowed),
        );

    // =========================================================================
    // Apply Middleware Stack (order matters - applied bottom to top)
    // =========================================================================

    // 1. Request body size limit (event payloads are small)
    info!(
        max_size_kb = config.max_request_body_size / 1024,
        "Request body size limit configured"
    );
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));

    // 2. CORS (the endpoint is called cross-origin from browsers)
    router = router.layer(cors);

    // 3. Tracing
    router = router.layer(TraceLayer::new_for_http());

    // 4. Request ID: generate on the way in, echo on the way out
    router = router.layer(PropagateRequestIdLayer::x_request_id());
    router = router.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    // 5. Rate Limiting (if enabled) - outermost, so limited requests are
    //    rejected before any other work happens
    if config.rate_limiting_enabled() {
        info!(
            rps = config.rate_limit_rps,
            burst = config.rate_limit_burst,
            "Per-IP rate limiting enabled"
        );
        router = router.layer(RateLimitLayer::new(
            config.rate_limit_rps,
            config.rate_limit_burst,
        )?);
    } else {
        info!("Rate limiting disabled (RATE_LIMIT_RPS=0)");
    }

    // Add state
    Ok(router.with_state(state))
}

/// Build CORS layer from configuration.
///
/// # Arguments
///
/// * `allowed_origins` - List of allowed origins, or `["*"]` for any origin
///
/// # Security Note
///
/// Using `*` (any origin) is convenient for development but should be
/// avoided in production. Specify explicit origins instead.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
