//! The tracking endpoint: validate, derive, relay, map the result.
//!
//! # Endpoint
//!
//! - `POST /events` - Accept a tracking event and relay it upstream
//!
//! The handler is a linear sequence of guards, each with a terminal
//! failure branch:
//!
//! 1. Upstream credentials present (500 naming the missing variable otherwise)
//! 2. Body parses as JSON; empty body means an empty event (400 otherwise)
//! 3. Field derivation from payload, headers, and cookies (cannot fail)
//! 4. One outbound call, its outcome mapped onto the response contract
//!
//! Non-POST methods never reach this handler; the router's method fallback
//! answers 405 for them.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, instrument};

use crate::error::{AppError, AppResult};
use crate::extract::{header_str, non_empty_header, parse_cookies, resolve_client_ip};
use crate::metrics::{self, outcomes};
use crate::models::{ClientSignals, EventsEnvelope, RelayResponse, ServerEvent, TrackPayload};
use crate::state::AppState;

/// Accept a tracking event and relay it to the Conversions API.
///
/// # Request Body
///
/// A JSON object in which every field is optional:
///
/// ```json
/// {
///   "event_name": "Purchase",
///   "event_time": 1700000000,
///   "event_id": "abc123",
///   "event_source_url": "https://shop.example/checkout",
///   "fbp": "fb.1.1700000000.1234567890"
/// }
/// ```
///
/// An empty body is a bare page view: everything is derived from the
/// request and defaults.
#[instrument(skip(state, headers, body))]
pub async fn track_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<RelayResponse>)> {
    let (pixel_id, access_token) = match (&state.config.pixel_id, &state.config.access_token) {
        (Some(pixel_id), Some(access_token)) => (pixel_id.clone(), access_token.clone()),
        _ => {
            metrics::record_invalid_request("missing_config");
            return Err(AppError::MissingConfig(
                state.config.missing_credentials().join(", "),
            ));
        }
    };

    let payload = parse_payload(&body).inspect_err(|_| {
        metrics::record_invalid_request("invalid_json");
    })?;

    let signals = ClientSignals {
        referer: non_empty_header(&headers, "referer").map(str::to_string),
        user_agent: non_empty_header(&headers, "user-agent").map(str::to_string),
        client_ip: resolve_client_ip(&headers),
        cookies: parse_cookies(header_str(&headers, "cookie")),
    };

    let event = ServerEvent::derive(payload, signals);
    let event_id = event.event_id.clone();
    let envelope = EventsEnvelope::single(event);

    metrics::record_event_received();

    let delivery = state
        .capi
        .send_events(&pixel_id, &access_token, &envelope)
        .await
        .inspect_err(|_| {
            metrics::record_relay_outcome(outcomes::FAILED);
        })?;

    debug!(
        event_id = %event_id,
        upstream_status = delivery.status,
        accepted = delivery.ok,
        "Relayed event"
    );

    let status = if delivery.ok {
        metrics::record_relay_outcome(outcomes::DELIVERED);
        StatusCode::OK
    } else {
        metrics::record_relay_outcome(outcomes::REJECTED);
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((
        status,
        Json(RelayResponse {
            ok: delivery.ok,
            meta: delivery.body,
            event_id,
        }),
    ))
}

/// Fallback for non-POST methods on the tracking route.
pub async fn method_not_allowed() -> AppError {
    metrics::record_invalid_request("method_not_allowed");
    AppError::MethodNotAllowed
}

/// Parse the request body into a [`TrackPayload`].
///
/// An empty or whitespace-only body deserializes to the all-default payload;
/// it is never classified as invalid JSON. Anything else must be a JSON
/// object matching the payload shape.
fn parse_payload(body: &[u8]) -> AppResult<TrackPayload> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TrackPayload::default());
    }

    serde_json::from_slice(body).map_err(|_| AppError::InvalidJson)
}
