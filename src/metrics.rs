//! Prometheus metrics collection
//!
//! This module provides metrics instrumentation for tracking:
//! - Requests by endpoint (`/chat`, `/exam-summary`)
//! - Generation attempts by provider slot and outcome
//! - Fallbacks from the primary to the secondary provider
//! - Generation latency by provider slot
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::gateway::Source;
use crate::providers::ProviderError;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Inbound endpoint label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Chat,
    ExamSummary,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Chat => "chat",
            Endpoint::ExamSummary => "exam_summary",
        }
    }
}

/// Outcome label for a single provider attempt
///
/// Closed set so the attempts counter stays at 2 slots × 5 outcomes = 10 series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Empty,
    RateLimited,
    Unavailable,
    Failed,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Empty => "empty",
            AttemptOutcome::RateLimited => "rate_limited",
            AttemptOutcome::Unavailable => "unavailable",
            AttemptOutcome::Failed => "failed",
        }
    }

    /// Outcome label for a failed attempt
    pub fn from_error(error: &ProviderError) -> Self {
        match error {
            ProviderError::RateLimited { .. } => AttemptOutcome::RateLimited,
            ProviderError::EmptyResponse { .. } => AttemptOutcome::Empty,
            e if e.is_transient() => AttemptOutcome::Unavailable,
            _ => AttemptOutcome::Failed,
        }
    }
}

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    generation_attempts: IntCounterVec,
    fallbacks: IntCounter,
    generation_duration: HistogramVec,
}

impl Metrics {
    /// Create a new Metrics instance with its own registry
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(
                "portal_gateway_requests_total",
                "Total number of requests received by endpoint",
            ),
            &["endpoint"],
        )?;

        let generation_attempts = IntCounterVec::new(
            Opts::new(
                "portal_gateway_generation_attempts_total",
                "Generation attempts by provider slot (primary/secondary) and outcome",
            ),
            &["provider", "outcome"],
        )?;

        // Only incremented when a secondary attempt actually follows a primary failure
        let fallbacks = IntCounter::with_opts(Opts::new(
            "portal_gateway_fallbacks_total",
            "Requests that fell back from the primary to the secondary provider",
        ))?;

        let generation_duration = HistogramVec::new(
            HistogramOpts::new(
                "portal_gateway_generation_duration_seconds",
                "Latency of a single generation attempt in seconds",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["provider"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(generation_attempts.clone()))?;
        registry.register(Box::new(fallbacks.clone()))?;
        registry.register(Box::new(generation_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            generation_attempts,
            fallbacks,
            generation_duration,
        })
    }

    /// Record an inbound request
    pub fn record_request(&self, endpoint: Endpoint) -> Result<(), prometheus::Error> {
        self.requests_total
            .get_metric_with_label_values(&[endpoint.as_str()])?
            .inc();
        Ok(())
    }

    /// Record the outcome of one provider attempt
    pub fn record_attempt(
        &self,
        source: Source,
        outcome: AttemptOutcome,
    ) -> Result<(), prometheus::Error> {
        self.generation_attempts
            .get_metric_with_label_values(&[source.as_str(), outcome.as_str()])?
            .inc();
        Ok(())
    }

    /// Record a primary → secondary fallback
    pub fn record_fallback(&self) {
        self.fallbacks.inc();
    }

    /// Record the latency of one provider attempt
    ///
    /// # Errors
    ///
    /// Rejects NaN, infinite and negative durations; they would corrupt every
    /// percentile of the histogram.
    pub fn record_generation_duration(
        &self,
        source: Source,
        seconds: f64,
    ) -> Result<(), prometheus::Error> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite and non-negative, got: {}",
                seconds
            )));
        }

        self.generation_duration
            .get_metric_with_label_values(&[source.as_str()])?
            .observe(seconds);
        Ok(())
    }

    /// Current attempt count for a slot/outcome pair
    pub fn attempts_count(&self, source: Source, outcome: AttemptOutcome) -> u64 {
        self.generation_attempts
            .get_metric_with_label_values(&[source.as_str(), outcome.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Current fallback count
    pub fn fallbacks_count(&self) -> u64 {
        self.fallbacks.get()
    }

    /// Encode all metrics in Prometheus text exposition format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_families.len(),
                    "Prometheus text encoder failed"
                );
                e
            })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                e.utf8_error().valid_up_to(),
                e
            ))
        })
    }
}
