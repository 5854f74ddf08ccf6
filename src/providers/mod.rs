//! Generation providers
//!
//! A provider takes a prompt and returns generated text. Each concrete client
//! turns raw HTTP failures into a [`ProviderError`] at the point where the
//! response is first observed, so the gateway and the HTTP layer only ever see
//! typed errors.

use crate::gateway::{classify, retry_delay};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::Value;

pub mod chat_completions;
pub mod gemini;

pub use chat_completions::ChatCompletionsProvider;
pub use gemini::GeminiProvider;

/// An external text generation service
///
/// Implemented by the real HTTP clients and by test doubles; the gateway holds
/// providers as `Arc<dyn GenerationProvider>`.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short provider identifier used in logs (e.g. "gemini")
    fn name(&self) -> &str;

    /// Model identifier reported back to clients
    fn model(&self) -> &str;

    /// Generate text for a prompt
    ///
    /// Returns the raw text, which may be empty; deciding what an empty answer
    /// means is left to the gateway.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Classified provider failure
///
/// `Display` output is safe to show to end users: it never includes upstream
/// bodies. The `detail` fields carry the raw information for logs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Provider asked the caller to back off
    #[error("AI provider rate limit reached")]
    RateLimited {
        provider: String,
        retry_after_ms: Option<u64>,
    },

    /// Provider is overloaded or temporarily down
    #[error("AI provider is temporarily unavailable")]
    Unavailable {
        provider: String,
        status: Option<u16>,
        detail: String,
    },

    /// Provider answered successfully but produced no text
    #[error("AI provider returned an empty response")]
    EmptyResponse { provider: String },

    /// Provider rejected the request with a non-retryable status
    #[error("AI provider rejected the request (status {status})")]
    Rejected {
        provider: String,
        status: u16,
        detail: String,
    },

    /// Network failure or timeout before a response arrived
    #[error("AI provider could not be reached")]
    Transport {
        provider: String,
        timed_out: bool,
        detail: String,
    },

    /// Response body did not have the expected shape
    #[error("AI provider returned a malformed response")]
    MalformedResponse { provider: String, detail: String },
}

impl ProviderError {
    /// Classify a non-success HTTP response
    ///
    /// Rate limits are recognized from the status code, the `error.code` field of
    /// the body, or the upstream message text. The retry delay comes from the
    /// structured detail list first and the `Retry-After` header second.
    pub fn from_http_status(
        provider: &str,
        status: u16,
        headers: &HeaderMap,
        body: &str,
    ) -> Self {
        let payload: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        let message = upstream_message(&payload).unwrap_or_else(|| body.trim().to_string());
        let body_code = payload
            .pointer("/error/code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok());

        let rate_limited = classify::is_rate_limit_signal(Some(status), &message)
            || classify::is_rate_limit_signal(body_code, "");

        if rate_limited {
            let retry_after_ms = retry_delay::parse_retry_delay(&payload)
                .or_else(|| retry_after_header_ms(headers));
            return Self::RateLimited {
                provider: provider.to_string(),
                retry_after_ms,
            };
        }

        if classify::is_transient_signal(Some(status), &message) {
            return Self::Unavailable {
                provider: provider.to_string(),
                status: Some(status),
                detail: message,
            };
        }

        Self::Rejected {
            provider: provider.to_string(),
            status,
            detail: message,
        }
    }

    /// Classify a transport-level failure from reqwest
    pub fn from_transport(provider: &str, error: &reqwest::Error) -> Self {
        let detail = error.to_string();
        let status = error.status().map(|s| s.as_u16());

        if classify::is_rate_limit_signal(status, &detail) {
            return Self::RateLimited {
                provider: provider.to_string(),
                retry_after_ms: None,
            };
        }

        Self::Transport {
            provider: provider.to_string(),
            timed_out: error.is_timeout(),
            detail,
        }
    }

    /// Name of the provider that produced this error
    pub fn provider(&self) -> &str {
        match self {
            Self::RateLimited { provider, .. }
            | Self::Unavailable { provider, .. }
            | Self::EmptyResponse { provider }
            | Self::Rejected { provider, .. }
            | Self::Transport { provider, .. }
            | Self::MalformedResponse { provider, .. } => provider,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Overloaded / service-unavailable class, including timeouts
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Transport { timed_out, .. } => *timed_out,
            Self::RateLimited { .. }
            | Self::EmptyResponse { .. }
            | Self::Rejected { .. }
            | Self::MalformedResponse { .. } => false,
        }
    }

    /// Provider-specified retry delay, when one was found
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    /// Raw upstream detail for logs (never sent to clients)
    pub fn detail(&self) -> &str {
        match self {
            Self::Unavailable { detail, .. }
            | Self::Rejected { detail, .. }
            | Self::Transport { detail, .. }
            | Self::MalformedResponse { detail, .. } => detail,
            Self::RateLimited { .. } | Self::EmptyResponse { .. } => "",
        }
    }
}

fn upstream_message(payload: &Value) -> Option<String> {
    ["/error/message", "/message"]
        .iter()
        .find_map(|pointer| payload.pointer(pointer).and_then(Value::as_str))
        .map(str::to_string)
}

/// `Retry-After` header expressed in whole seconds
fn retry_after_header_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|secs| secs.checked_mul(1000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn no_headers() -> HeaderMap {
        HeaderMap::new()
    }

    #[test]
    fn test_429_with_retry_info_is_rate_limited_with_delay() {
        let body = r#"{
            "error": {
                "code": 429,
                "message": "Resource has been exhausted (e.g. check quota).",
                "status": "RESOURCE_EXHAUSTED",
                "details": [
                    {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "12s"}
                ]
            }
        }"#;
        let err = ProviderError::from_http_status("gemini", 429, &no_headers(), body);
        assert_eq!(
            err,
            ProviderError::RateLimited {
                provider: "gemini".to_string(),
                retry_after_ms: Some(12_000),
            }
        );
    }

    #[test]
    fn test_rate_limit_message_without_429_status() {
        let body = r#"{"error": {"message": "Rate limit reached for model", "type": "tokens"}}"#;
        let err = ProviderError::from_http_status("groq", 400, &no_headers(), body);
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after_ms(), None);
    }

    #[test]
    fn test_error_code_in_body_signals_rate_limit() {
        let body = r#"{"error": {"code": 429, "message": "quota"}}"#;
        let err = ProviderError::from_http_status("gemini", 400, &no_headers(), body);
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_retry_after_header_used_when_payload_has_no_delay() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        let err = ProviderError::from_http_status("groq", 429, &headers, "slow down");
        assert_eq!(err.retry_after_ms(), Some(7000));
    }

    #[test]
    fn test_503_overloaded_is_transient() {
        let body = r#"{"error": {"code": 503, "message": "The model is overloaded. Please try again later.", "status": "UNAVAILABLE"}}"#;
        let err = ProviderError::from_http_status("gemini", 503, &no_headers(), body);
        assert!(matches!(err, ProviderError::Unavailable { .. }));
        assert!(err.is_transient());
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_400_is_rejected_with_detail_for_logs() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        let err = ProviderError::from_http_status("gemini", 400, &no_headers(), body);
        assert!(matches!(err, ProviderError::Rejected { status: 400, .. }));
        assert!(!err.is_transient());
        assert_eq!(err.detail(), "API key not valid");
    }

    #[test]
    fn test_display_never_leaks_upstream_detail() {
        let err = ProviderError::Rejected {
            provider: "gemini".to_string(),
            status: 400,
            detail: "API key AIza-secret not valid".to_string(),
        };
        assert!(!err.to_string().contains("AIza-secret"));
    }

    #[test]
    fn test_non_json_body_uses_raw_text() {
        let err = ProviderError::from_http_status("groq", 500, &no_headers(), "  upstream exploded ");
        assert_eq!(err.detail(), "upstream exploded");
        assert_eq!(err.provider(), "groq");
    }
}
