//! HTTP middleware for the relay's public surface.
//!
//! Only one custom layer lives here: per-IP rate limiting, keyed by the
//! same client IP resolution the relay forwards upstream. Request IDs,
//! tracing, CORS, and body limits come from `tower-http` and are wired in
//! `routes.rs`.

pub mod rate_limit;

pub use rate_limit::{RateLimitError, RateLimitLayer};
