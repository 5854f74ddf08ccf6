//! Generation gateway with primary → secondary fallback
//!
//! The gateway owns the two injected providers and decides, per call, which of them
//! answers:
//!
//! - Primary succeeds with non-empty text → done, source `primary`.
//! - Primary is rate limited → fail immediately. The provider told us to back off;
//!   silently moving the load to the secondary would hide that from the caller.
//! - Primary fails any other way (overloaded, timeout, rejected, empty text) →
//!   log and try the secondary.
//! - Secondary succeeds with non-empty text → done, source `secondary`; otherwise
//!   its error is what the caller sees.
//!
//! Attempts are strictly sequential and each provider is tried at most once, so a
//! call produces exactly one result or exactly one error.

use crate::metrics::{AttemptOutcome, Metrics};
use crate::middleware::RequestId;
use crate::providers::{GenerationProvider, ProviderError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub mod classify;
pub mod retry_delay;

pub use classify::{DEFAULT_RETRY_AFTER_MS, ErrorClass};

/// Which provider slot produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Primary,
    Secondary,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Primary => "primary",
            Source::Secondary => "secondary",
        }
    }
}

/// Successful generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
    pub source: Source,
    /// Model name reported by the provider that answered
    pub model: String,
}

/// Gateway failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// Neither provider has credentials
    #[error("No generation provider is configured")]
    NoProvider,

    /// The last provider attempted failed (or the primary was rate limited)
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_rate_limited())
    }
}

/// Orchestrates the primary and secondary providers
#[derive(Clone)]
pub struct GenerationGateway {
    primary: Option<Arc<dyn GenerationProvider>>,
    secondary: Option<Arc<dyn GenerationProvider>>,
    metrics: Arc<Metrics>,
}

impl GenerationGateway {
    pub fn new(
        primary: Option<Arc<dyn GenerationProvider>>,
        secondary: Option<Arc<dyn GenerationProvider>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            primary,
            secondary,
            metrics,
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Generate text for `prompt`, falling back to the secondary provider when allowed
    pub async fn generate(
        &self,
        prompt: &str,
        request_id: RequestId,
    ) -> Result<GenerationResult, GenerationError> {
        let primary_failure = match &self.primary {
            Some(primary) => match self.attempt(primary, Source::Primary, prompt, request_id).await
            {
                Ok(result) => return Ok(result),
                Err(e) if e.is_rate_limited() => {
                    tracing::warn!(
                        request_id = %request_id,
                        provider = %primary.name(),
                        retry_after_ms = ?e.retry_after_ms(),
                        "Primary provider rate limited, not falling back"
                    );
                    return Err(e.into());
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::warn!(
                            request_id = %request_id,
                            provider = %primary.name(),
                            error = %e,
                            detail = %e.detail(),
                            "Primary provider overloaded or unavailable"
                        );
                    } else {
                        tracing::warn!(
                            request_id = %request_id,
                            provider = %primary.name(),
                            error = %e,
                            detail = %e.detail(),
                            "Primary provider failed"
                        );
                    }
                    Some(e)
                }
            },
            None => {
                tracing::debug!(
                    request_id = %request_id,
                    "No primary provider configured, going straight to secondary"
                );
                None
            }
        };

        let Some(secondary) = &self.secondary else {
            return Err(match primary_failure {
                Some(e) => {
                    tracing::error!(
                        request_id = %request_id,
                        error = %e,
                        "Primary provider failed and no secondary provider is configured"
                    );
                    e.into()
                }
                None => GenerationError::NoProvider,
            });
        };

        if primary_failure.is_some() {
            self.metrics.record_fallback();
            tracing::info!(
                request_id = %request_id,
                provider = %secondary.name(),
                model = %secondary.model(),
                "Falling back to secondary provider"
            );
        }

        self.attempt(secondary, Source::Secondary, prompt, request_id)
            .await
            .map_err(|e| {
                tracing::error!(
                    request_id = %request_id,
                    provider = %secondary.name(),
                    error = %e,
                    detail = %e.detail(),
                    "Secondary provider failed"
                );
                e.into()
            })
    }

    /// One provider call, with empty-text detection and metrics
    async fn attempt(
        &self,
        provider: &Arc<dyn GenerationProvider>,
        source: Source,
        prompt: &str,
        request_id: RequestId,
    ) -> Result<GenerationResult, ProviderError> {
        tracing::debug!(
            request_id = %request_id,
            provider = %provider.name(),
            model = %provider.model(),
            slot = source.as_str(),
            prompt_length = prompt.len(),
            "Calling generation provider"
        );

        let started = Instant::now();
        let outcome = provider.generate(prompt).await.and_then(|text| {
            if text.trim().is_empty() {
                Err(ProviderError::EmptyResponse {
                    provider: provider.name().to_string(),
                })
            } else {
                Ok(text)
            }
        });
        let elapsed = started.elapsed().as_secs_f64();

        let label = match &outcome {
            Ok(_) => AttemptOutcome::Success,
            Err(e) => AttemptOutcome::from_error(e),
        };
        if let Err(e) = self.metrics.record_attempt(source, label) {
            tracing::error!(request_id = %request_id, error = %e, "Metrics recording failed (non-fatal)");
        }
        if let Err(e) = self.metrics.record_generation_duration(source, elapsed) {
            tracing::error!(request_id = %request_id, error = %e, "Metrics recording failed (non-fatal)");
        }

        let text = outcome?;
        tracing::info!(
            request_id = %request_id,
            provider = %provider.name(),
            slot = source.as_str(),
            response_length = text.len(),
            elapsed_seconds = elapsed,
            "Generation succeeded"
        );

        Ok(GenerationResult {
            text,
            source,
            model: provider.model().to_string(),
        })
    }
}
