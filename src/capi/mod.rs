//! HTTP client for the Meta Conversions API.
//!
//! The Conversions API is treated as an opaque collaborator: one POST of a
//! batch envelope per inbound request, no retries, no backoff. The client
//! distinguishes two outcomes explicitly:
//!
//! - [`Delivery`] - the HTTP exchange completed; carries the upstream
//!   status and parsed JSON body whether or not the upstream accepted
//!   the event.
//! - `Err(AppError::Upstream)` - the call itself failed (connect error,
//!   timeout, or an unparseable upstream body).
//!
//! This split keeps the handler's response mapping total: every branch of
//! the caller-visible contract corresponds to exactly one variant here.

use std::time::Instant;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::EventsEnvelope;

/// Outcome of a completed HTTP exchange with the Conversions API.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Whether the upstream returned a 2xx status
    pub ok: bool,
    /// Upstream HTTP status code
    pub status: u16,
    /// Upstream response body, parsed as JSON
    pub body: serde_json::Value,
}

/// Client for relaying event envelopes to the Conversions API.
///
/// Cheap to clone; the inner `reqwest::Client` shares its connection pool
/// across clones, so one instance serves all concurrent handler tasks.
#[derive(Clone)]
pub struct CapiClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl CapiClient {
    /// Build a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the underlying HTTP client cannot
    /// be constructed (TLS backend initialization failure).
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.graph_api_base_url.trim_end_matches('/').to_string(),
            api_version: config.graph_api_version.clone(),
        })
    }

    /// The ingestion URL for a pixel, without credentials.
    fn events_url(&self, pixel_id: &str) -> String {
        format!("{}/{}/{}/events", self.base_url, self.api_version, pixel_id)
    }

    /// Relay an event envelope to the Conversions API.
    ///
    /// Exactly one outbound POST per call. The access token travels as a
    /// query credential, as the Graph API expects.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upstream` when the exchange does not complete:
    /// connection failure, timeout, or a response body that is not JSON.
    pub async fn send_events(
        &self,
        pixel_id: &str,
        access_token: &str,
        envelope: &EventsEnvelope,
    ) -> AppResult<Delivery> {
        let url = self.events_url(pixel_id);
        let started = Instant::now();

        let result = self
            .http
            .post(&url)
            .query(&[("access_token", access_token)])
            .json(envelope)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                metrics::record_relay_duration("transport_error", started.elapsed().as_secs_f64());
                return Err(AppError::Upstream(e.to_string()));
            }
        };

        let status = response.status();
        metrics::record_relay_duration(status.as_str(), started.elapsed().as_secs_f64());

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid upstream response body: {e}")))?;

        Ok(Delivery {
            ok: status.is_success(),
            status: status.as_u16(),
            body,
        })
    }
}
