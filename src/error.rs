use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error types with their caller-visible HTTP mapping.
///
/// # Response Contract
///
/// The tracking endpoint has a fixed, documented contract that browser
/// pixels depend on:
///
/// - `MethodNotAllowed` - 405, plain text `Method Not Allowed`
/// - `MissingConfig` - 500, plain text naming the unset variable(s)
/// - `InvalidJson` - 400, plain text `Invalid JSON`
/// - `Upstream` - 500, JSON `{"ok": false, "error": "..."}` for
///   transport-level failures where no upstream response exists
///
/// Completed upstream exchanges (success or failure) are not errors; the
/// handler maps them to `{ok, meta, event_id}` bodies directly.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Missing {0}")]
    MissingConfig(String),

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Body for transport-level relay failures, where there is no upstream
/// response to echo back.
#[derive(Serialize)]
struct UpstreamErrorBody {
    ok: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Full detail server-side; the bodies below are the public contract
        tracing::error!(error = %self, "Request failed");

        match &self {
            AppError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response()
            }

            // Deployment errors: the diagnostic names the missing variable(s)
            // so a misconfigured environment is visible to the caller.
            AppError::MissingConfig(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }

            AppError::InvalidJson => (StatusCode::BAD_REQUEST, "Invalid JSON").into_response(),

            // The call itself failed (connect, timeout, malformed upstream
            // body); surface the cause so the caller can diagnose.
            AppError::Upstream(cause) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(UpstreamErrorBody {
                    ok: false,
                    error: cause.clone(),
                }),
            )
                .into_response(),

            AppError::Internal(_) | AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
                .into_response(),
        }
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
