//! Secondary provider: OpenAI-compatible `chat/completions` API (Groq by default)

use super::{GenerationProvider, ProviderError};
use crate::config::{ApiKey, SecondaryProviderConfig};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for `POST {base_url}/chat/completions`
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: ApiKey,
    max_tokens: u32,
    temperature: f64,
}

impl ChatCompletionsProvider {
    pub const NAME: &'static str = "chat-completions";

    pub fn from_config(config: &SecondaryProviderConfig, timeout: Duration) -> AppResult<Self> {
        let api_key = config.api_key().cloned().ok_or_else(|| {
            AppError::Config("providers.secondary has no API key".to_string())
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::Internal(format!("Failed to build secondary provider HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            api_key,
            max_tokens: config.max_tokens(),
            temperature: config.temperature(),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl GenerationProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(Self::NAME, &e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(Self::NAME, &e))?;

        if !status.is_success() {
            return Err(ProviderError::from_http_status(
                Self::NAME,
                status.as_u16(),
                &headers,
                &text,
            ));
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse {
                provider: Self::NAME.to_string(),
                detail: e.to_string(),
            })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}
