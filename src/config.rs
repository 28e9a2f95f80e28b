//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Upstream Credentials
//!
//! - `META_PIXEL_ID`: the pixel (dataset) the relayed events are attributed to
//! - `META_CAPI_ACCESS_TOKEN`: Conversions API access token
//!
//! Both are read once at startup but kept optional: the service starts and
//! serves health checks without them, and the tracking endpoint answers
//! 500 with a diagnostic naming whichever variable is missing.
//!
//! # Tuning
//!
//! - `UPSTREAM_TIMEOUT_SECS`: outbound Graph API call timeout (default: 30)
//! - `RATE_LIMIT_RPS` / `RATE_LIMIT_BURST`: per-IP rate limiting (0 disables)
//! - `MAX_REQUEST_BODY_SIZE`: inbound body cap in bytes (default: 1MB)

use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Environment variable holding the pixel/dataset identifier.
pub const PIXEL_ID_VAR: &str = "META_PIXEL_ID";

/// Environment variable holding the Conversions API access token.
pub const ACCESS_TOKEN_VAR: &str = "META_CAPI_ACCESS_TOKEN";

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    // =========================================================================
    // Upstream (Conversions API) Configuration
    // =========================================================================
    /// Pixel/dataset identifier the events are attributed to.
    /// Read from `META_PIXEL_ID`; absence is reported per request, not at startup.
    pub pixel_id: Option<String>,

    /// Conversions API access token, sent as a query credential.
    /// Read from `META_CAPI_ACCESS_TOKEN`.
    pub access_token: Option<String>,

    /// Base URL of the Graph API (default: "https://graph.facebook.com").
    /// Overridable so tests can point the relay at a mock server.
    pub graph_api_base_url: String,

    /// Graph API version segment (default: "v19.0")
    pub graph_api_version: String,

    /// Timeout for the outbound relay call (default: 30 seconds)
    pub upstream_timeout: Duration,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Requests per second limit per client IP (default: 0 = disabled)
    pub rate_limit_rps: u32,

    /// Burst capacity - allows temporary spikes above rps limit (default: 50)
    pub rate_limit_burst: u32,

    // =========================================================================
    // Request Limits Configuration
    // =========================================================================
    /// Maximum request body size in bytes (default: 1MB).
    /// Event payloads are small; anything larger is abuse.
    pub max_request_body_size: usize,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Comma-separated list of allowed CORS origins.
    /// The endpoint is called from browsers, so CORS is load-bearing here.
    /// Use "*" to allow all origins (not recommended for production).
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any value fails to parse
    /// (e.g., non-numeric PORT) or validation fails.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,

            // Upstream
            pixel_id: env::var(PIXEL_ID_VAR).ok().filter(|v| !v.is_empty()),
            access_token: env::var(ACCESS_TOKEN_VAR).ok().filter(|v| !v.is_empty()),
            graph_api_base_url: env::var("GRAPH_API_BASE_URL")
                .unwrap_or_else(|_| "https://graph.facebook.com".to_string()),
            graph_api_version: env::var("GRAPH_API_VERSION")
                .unwrap_or_else(|_| "v19.0".to_string()),
            upstream_timeout: Duration::from_secs(Self::parse_env("UPSTREAM_TIMEOUT_SECS", 30)?),

            // Rate limiting
            rate_limit_rps: Self::parse_env("RATE_LIMIT_RPS", 0)?,
            rate_limit_burst: Self::parse_env("RATE_LIMIT_BURST", 50)?,

            // Request limits
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 1024 * 1024)?, // 1MB

            // Security
            cors_allowed_origins: Self::parse_cors_origins(),

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.upstream_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "UPSTREAM_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.graph_api_base_url.is_empty() {
            return Err(AppError::ConfigError(
                "GRAPH_API_BASE_URL cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if rate limiting is enabled.
    pub fn rate_limiting_enabled(&self) -> bool {
        self.rate_limit_rps > 0
    }

    /// Names of required upstream credential variables that are currently unset.
    ///
    /// Empty when the relay is fully configured.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.pixel_id.is_none() {
            missing.push(PIXEL_ID_VAR);
        }
        if self.access_token.is_none() {
            missing.push(ACCESS_TOKEN_VAR);
        }
        missing
    }

    /// Check if both upstream credentials are configured.
    pub fn upstream_configured(&self) -> bool {
        self.pixel_id.is_some() && self.access_token.is_some()
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
/// Credentials default to `None`, mirroring an unset environment.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            // Upstream
            pixel_id: None,
            access_token: None,
            graph_api_base_url: "https://graph.facebook.com".to_string(),
            graph_api_version: "v19.0".to_string(),
            upstream_timeout: Duration::from_secs(30),
            // Rate limiting
            rate_limit_rps: 0,
            rate_limit_burst: 50,
            // Request limits
            max_request_body_size: 1024 * 1024, // 1MB
            // Security
            cors_allowed_origins: vec!["*".to_string()],
            // Observability
            log_level: "info".to_string(),
            metrics_port: 9090,
        }
    }
}
