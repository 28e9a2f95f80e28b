//! # Conversions API Relay
//!
//! A server-side relay that accepts tracking events from web clients and
//! forwards them to the Meta Conversions API, enriched with the network
//! and identity signals only the server can see reliably:
//!
//! - **Client IP**: resolved from CDN/proxy headers with a fixed priority
//! - **User agent**: taken from the request before any payload fallback
//! - **Browser identifiers**: `_fbp`/`_fbc` cookies, percent-decoded
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Rate Limit → Request ID → Trace → CORS)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (track, health)                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Signal extraction (IP resolver, cookie jar)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CapiClient (reqwest, one POST per event, no retries)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Meta Conversions API (graph.facebook.com)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use capi_relay::{AppState, CapiClient, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let capi = CapiClient::new(&config)?;
//!
//!     let state = AppState::new(capi, config);
//!     let app = build_router(state)?;
//!
//!     // Start the server...
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Credentials come from the environment:
//! ```bash
//! META_PIXEL_ID=1234567890 META_CAPI_ACCESS_TOKEN=EAAB... cargo run
//! ```
//!
//! Without them the server still starts; the tracking endpoint reports the
//! missing variables with a 500 until they are provided.

pub mod capi;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

// Re-exports for convenience
pub use capi::{CapiClient, Delivery};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
