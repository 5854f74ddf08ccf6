//! Chat endpoint handler
//!
//! Handles POST /chat: a free-text question answered by the generation gateway.

use crate::error::AppError;
use crate::handlers::AppState;
use crate::handlers::extractor::ApiJson;
use crate::metrics::Endpoint;
use crate::middleware::RequestId;
use crate::prompt;
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

/// Message returned when the chat message is missing or blank
pub const MESSAGE_REQUIRED: &str = "Message required";

/// Chat request from client
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    student_email: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            student_email: None,
        }
    }

    /// Trimmed message, or `None` when missing or whitespace-only
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    pub fn student_email(&self) -> Option<&str> {
        self.student_email.as_deref()
    }
}

/// Chat response to client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatResponse {
    /// Generated answer
    pub response: String,
    /// Model that produced the answer
    pub model: String,
}

/// POST /chat handler
///
/// At most two sequential provider calls (primary, then secondary on failure);
/// blank messages are rejected before any provider is touched.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if let Err(e) = state.metrics().record_request(Endpoint::Chat) {
        tracing::error!(request_id = %request_id, error = %e, "Metrics recording failed (non-fatal)");
    }

    let Some(message) = request.message() else {
        tracing::debug!(request_id = %request_id, "Rejected chat request with empty message");
        return Err(AppError::Validation(MESSAGE_REQUIRED.to_string()));
    };

    tracing::debug!(
        request_id = %request_id,
        message_length = message.len(),
        has_student_email = request.student_email().is_some(),
        "Received chat request"
    );

    let prompt = prompt::chat_prompt(message, request.student_email());
    let result = state.gateway().generate(&prompt, request_id).await?;

    tracing::info!(
        request_id = %request_id,
        source = result.source.as_str(),
        model = %result.model,
        response_length = result.text.len(),
        "Chat request completed"
    );

    Ok(Json(ChatResponse {
        response: result.text,
        model: result.model,
    }))
}
