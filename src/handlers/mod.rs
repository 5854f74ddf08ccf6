//! HTTP request handlers

use crate::config::Config;
use crate::error::AppResult;
use crate::gateway::GenerationGateway;
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::providers::{ChatCompletionsProvider, GeminiProvider, GenerationProvider};
use crate::records::{ExamRecords, HttpExamRecords};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod exam_summary;
pub mod extractor;
pub mod health;
pub mod metrics;

/// Application state shared across all handlers
///
/// Every collaborator is constructed once at startup and injected here; handlers
/// never build clients themselves. All fields are Arc'd for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    gateway: Arc<GenerationGateway>,
    records: Arc<dyn ExamRecords>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Build the production state from a validated configuration
    ///
    /// Providers without an API key are left out; a warning is logged when that
    /// leaves the gateway with nothing to call.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.server.request_timeout_seconds);
        let metrics = Arc::new(Metrics::new().map_err(|e| {
            crate::error::AppError::Internal(format!("Failed to register metrics: {}", e))
        })?);

        let primary = config
            .primary_provider()
            .map(|p| GeminiProvider::from_config(p, timeout))
            .transpose()?
            .map(|p| Arc::new(p) as Arc<dyn GenerationProvider>);

        let secondary = config
            .secondary_provider()
            .map(|p| ChatCompletionsProvider::from_config(p, timeout))
            .transpose()?
            .map(|p| Arc::new(p) as Arc<dyn GenerationProvider>);

        if primary.is_none() && secondary.is_none() {
            tracing::warn!(
                "No generation provider has an API key. /chat and /exam-summary will answer 500 \
                until GEMINI_API_KEY or GROQ_API_KEY is set."
            );
        }

        let gateway = GenerationGateway::new(primary, secondary, metrics.clone());
        let records: Arc<dyn ExamRecords> = Arc::new(HttpExamRecords::new(timeout)?);

        Ok(Self::from_parts(config, gateway, records, metrics))
    }

    /// Assemble state from already-built collaborators
    pub fn from_parts(
        config: Arc<Config>,
        gateway: GenerationGateway,
        records: Arc<dyn ExamRecords>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config,
            gateway: Arc::new(gateway),
            records,
            metrics,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &GenerationGateway {
        &self.gateway
    }

    pub fn records(&self) -> &dyn ExamRecords {
        self.records.as_ref()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the HTTP router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat::handler))
        .route("/exam-summary", post(exam_summary::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
