//! Error classification for the generation path
//!
//! Two places use this module. Provider clients call the signal predicates when a
//! raw HTTP failure is first observed, to build a typed [`ProviderError`]. The HTTP
//! layer calls [`classify`] once on whatever the gateway returned, to pick the
//! status code and the user-facing message.

use super::GenerationError;
use crate::error::{AppError, GENERIC_FAILURE_MESSAGE};
use crate::providers::ProviderError;

/// Delay reported to clients when the provider gave none
pub const DEFAULT_RETRY_AFTER_MS: u64 = 5000;

/// Message returned when no provider has credentials
pub const MISCONFIGURED_MESSAGE: &str = "AI service is not configured. Please contact the administrator.";

/// Does a status/message pair signal a rate limit?
///
/// True for status 429, or a message mentioning "429" or "rate limit" in any case.
pub fn is_rate_limit_signal(status: Option<u16>, message: &str) -> bool {
    if status == Some(429) {
        return true;
    }
    let lowered = message.to_ascii_lowercase();
    lowered.contains("429") || lowered.contains("rate limit")
}

/// Does a status/message pair signal a transient overload?
///
/// Gateway errors (502/503/504) and messages mentioning "overloaded" or
/// "unavailable" count; plain 500s do not.
pub fn is_transient_signal(status: Option<u16>, message: &str) -> bool {
    if matches!(status, Some(502..=504)) {
        return true;
    }
    let lowered = message.to_ascii_lowercase();
    lowered.contains("overloaded") || lowered.contains("unavailable")
}

/// Final classification of a generation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// Respond 429 with this delay
    RateLimited { retry_after_ms: u64 },
    /// Respond 500: no provider credentials
    Misconfigured { message: String },
    /// Respond 500 with this message
    ServerError { message: String },
}

/// Classify a gateway failure into the response it should produce
pub fn classify(error: &GenerationError) -> ErrorClass {
    match error {
        GenerationError::NoProvider => ErrorClass::Misconfigured {
            message: MISCONFIGURED_MESSAGE.to_string(),
        },
        GenerationError::Provider(ProviderError::RateLimited { retry_after_ms, .. }) => {
            ErrorClass::RateLimited {
                retry_after_ms: retry_after_ms.unwrap_or(DEFAULT_RETRY_AFTER_MS),
            }
        }
        GenerationError::Provider(provider_error) => {
            let message = provider_error.to_string();
            ErrorClass::ServerError {
                message: if message.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    message
                },
            }
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(error: GenerationError) -> Self {
        let class = classify(&error);

        match &error {
            GenerationError::Provider(provider_error) => tracing::error!(
                provider = %provider_error.provider(),
                error = %provider_error,
                detail = %provider_error.detail(),
                class = ?class,
                "Generation failed"
            ),
            GenerationError::NoProvider => tracing::error!(
                class = ?class,
                "Generation failed: no provider configured"
            ),
        }

        match class {
            ErrorClass::RateLimited { retry_after_ms } => AppError::RateLimited { retry_after_ms },
            ErrorClass::Misconfigured { message } => AppError::Misconfigured(message),
            ErrorClass::ServerError { message } => AppError::Internal(message),
        }
    }
}
