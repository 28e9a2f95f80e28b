//! Per-IP rate limiting for the tracking endpoint.
//!
//! # Algorithm
//!
//! Uses the Governor crate's Generic Cell Rate Algorithm (a "leaky bucket
//! as a meter"): smooth sustained limiting with a configurable burst, keyed
//! per client so one noisy pixel cannot starve everyone else.
//!
//! # Keying
//!
//! Requests are keyed by the same client IP resolution the relay forwards
//! upstream (CDN header, platform header, `X-Forwarded-For` first entry,
//! `X-Real-IP`). Requests with no resolvable IP share a single "unknown"
//! bucket, so headerless floods are still collectively limited.
//!
//! These headers are client-controlled unless a trusted proxy overwrites
//! them; deploy behind one before relying on per-IP limits.
//!
//! # Response
//!
//! On rate limit exceeded (429):
//! - `Retry-After`: seconds until the next request will be accepted
//! - `X-RateLimit-Limit`: configured RPS limit

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tower::{Layer, Service};
use tracing::warn;

use crate::extract::resolve_client_ip;

/// Shared bucket key for requests with no resolvable client IP.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Error type for rate limit layer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    /// RPS value cannot be zero; disable the layer instead.
    ZeroRps,
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitError::ZeroRps => {
                write!(f, "RPS must be greater than 0; omit the layer for no limiting")
            }
        }
    }
}

impl std::error::Error for RateLimitError {}

/// Per-client rate limiter keyed by resolved IP string.
type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting layer for the Tower middleware stack.
///
/// # Example
///
/// ```rust,ignore
/// let layer = RateLimitLayer::new(100, 50)?; // 100 RPS per IP, 50 burst
/// let app = Router::new()
///     .route("/events", post(handler))
///     .layer(layer);
/// ```
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<KeyedLimiter>,
    /// Configured RPS limit (echoed in response headers)
    limit: u32,
}

impl RateLimitLayer {
    /// Create a new per-IP rate limit layer.
    ///
    /// # Arguments
    ///
    /// * `rps` - Sustained requests per second per client IP
    /// * `burst` - Additional burst capacity per client IP
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::ZeroRps` if `rps` is 0; rate limiting is
    /// disabled by not applying the layer, not by a zero quota.
    pub fn new(rps: u32, burst: u32) -> Result<Self, RateLimitError> {
        let rps_nonzero = NonZeroU32::new(rps).ok_or(RateLimitError::ZeroRps)?;

        const MIN_BURST: NonZeroU32 = NonZeroU32::new(1).unwrap();
        let burst_nonzero = NonZeroU32::new(burst).unwrap_or(MIN_BURST);

        let quota = Quota::per_second(rps_nonzero).allow_burst(burst_nonzero);

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            limit: rps,
        })
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            limit: self.limit,
        }
    }
}

/// Rate limiting service wrapper.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<KeyedLimiter>,
    limit: u32,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let limit = self.limit;
        let mut inner = self.inner.clone();

        let client_key =
            resolve_client_ip(req.headers()).unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        Box::pin(async move {
            match limiter.check_key(&client_key) {
                Ok(_) => inner.call(req).await,
                Err(not_until) => {
                    let wait_time =
                        not_until.wait_time_from(DefaultClock::default().now());
                    let retry_after = wait_time.as_secs().max(1);

                    warn!(
                        client_ip = %client_key,
                        retry_after_secs = retry_after,
                        "Rate limit exceeded"
                    );

                    let response = (
                        StatusCode::TOO_MANY_REQUESTS,
                        [
                            ("Retry-After", retry_after.to_string()),
                            ("X-RateLimit-Limit", limit.to_string()),
                        ],
                        "Rate limit exceeded. Please retry later.",
                    )
                        .into_response();

                    Ok(response)
                }
            }
        })
    }
}
