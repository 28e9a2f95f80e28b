//! Shared application state for Axum handlers.
//!
//! The relay is stateless per request: the only process-wide data is the
//! configuration (read once at startup) and the upstream HTTP client
//! (shared for connection pooling). Cloning `AppState` is cheap; every
//! field is either `Arc`-wrapped or internally reference-counted.

use std::sync::Arc;
use std::time::Instant;

use crate::capi::CapiClient;
use crate::config::Config;

/// Shared application state for Axum handlers.
///
/// Cloned into each request handler. Concurrent invocations are fully
/// independent: configuration is read-only and the HTTP client is
/// internally synchronized.
#[derive(Clone)]
pub struct AppState {
    /// Client for the Conversions API
    pub capi: CapiClient,
    /// Application configuration
    pub config: Arc<Config>,
    /// Timestamp when the application started
    pub started_at: Instant,
}

impl AppState {
    /// Create new application state from an upstream client and configuration.
    pub fn new(capi: CapiClient, config: Config) -> Self {
        Self {
            capi,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
