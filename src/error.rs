//! Error types for the portal assistant gateway
//!
//! All errors implement `IntoResponse` for Axum handlers. The JSON bodies follow the
//! portal's existing contract: `{message}` for client errors, `{message, type}` for
//! server-side failures and `{message, retryAfterMs, type}` for rate limits.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Machine-readable tag attached to 429 responses
pub const RATE_LIMIT_TYPE: &str = "RATE_LIMIT";

/// Machine-readable tag attached to 500 responses
pub const SERVER_ERROR_TYPE: &str = "SERVER_ERROR";

/// Message used when a server-side failure carries nothing presentable
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate a response. Please try again later.";

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or unresolvable request input (400)
    #[error("{0}")]
    Validation(String),

    /// No folder, exam or subject matches the requested identifiers (404)
    #[error("{0}")]
    NotFound(String),

    /// Upstream provider asked us to back off (429)
    #[error("Rate limit exceeded, retry after {retry_after_ms} ms")]
    RateLimited { retry_after_ms: u64 },

    /// No generation provider credentials were supplied at startup (500)
    #[error("{0}")]
    Misconfigured(String),

    /// Exam-records collaborator answered with a non-success status
    #[error("Exam records service returned {status}: {message}")]
    RecordsUpstream { status: u16, message: String },

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Seconds shown to the user for a rate-limit delay, rounded up
    pub fn retry_after_seconds(retry_after_ms: u64) -> u64 {
        retry_after_ms.div_ceil(1000)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "message": msg })),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            Self::RateLimited { retry_after_ms } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "message": format!(
                        "Rate limit reached. Please try again in {} seconds.",
                        Self::retry_after_seconds(*retry_after_ms)
                    ),
                    "retryAfterMs": retry_after_ms,
                    "type": RATE_LIMIT_TYPE,
                }),
            ),
            Self::RecordsUpstream { status, message } => (
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                json!({ "message": message }),
            ),
            Self::Misconfigured(msg) | Self::Internal(msg) | Self::Config(msg) => {
                let message = if msg.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    msg.clone()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": message, "type": SERVER_ERROR_TYPE }),
                )
            }
            Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": self.to_string(), "type": SERVER_ERROR_TYPE }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
