//! Shared helpers for HTTP-level integration tests
//!
//! Every test builds the real router from a TOML config whose provider and
//! records URLs point at wiremock servers.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header::CONTENT_TYPE},
};
use portal_assist::{
    config::Config,
    handlers::{self, AppState},
};
use serde_json::{Value, json};
use std::sync::Arc;

pub const PRIMARY_MODEL: &str = "gemini-1.5-flash";
pub const SECONDARY_MODEL: &str = "llama-3.1-8b-instant";

/// Path the primary provider is called on
pub fn primary_path() -> String {
    format!("/models/{}:generateContent", PRIMARY_MODEL)
}

/// Config with optional primary, secondary and records origins
pub fn config(primary: Option<&str>, secondary: Option<&str>, records: Option<&str>) -> Config {
    let mut toml = String::from(
        r#"
[server]
host = "127.0.0.1"
port = 3000
request_timeout_seconds = 5
"#,
    );
    if let Some(url) = primary {
        toml.push_str(&format!(
            "\n[providers.primary]\nmodel = \"{}\"\nbase_url = \"{}\"\napi_key = \"primary-key\"\n",
            PRIMARY_MODEL, url
        ));
    }
    if let Some(url) = secondary {
        toml.push_str(&format!(
            "\n[providers.secondary]\nmodel = \"{}\"\nbase_url = \"{}\"\napi_key = \"secondary-key\"\n",
            SECONDARY_MODEL, url
        ));
    }
    if let Some(url) = records {
        toml.push_str(&format!("\n[records]\nbase_url = \"{}\"\n", url));
    }

    let config: Config = toml::from_str(&toml).expect("should parse test config");
    config.validate().expect("test config should validate");
    config
}

pub fn app(config: Config) -> Router {
    let state = AppState::new(Arc::new(config)).expect("should create AppState");
    handlers::router(state)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("should build request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("should read body");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Successful Gemini `generateContent` payload
pub fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

/// Successful chat-completions payload
pub fn chat_completion_text(text: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": SECONDARY_MODEL,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }]
    })
}

/// Gemini 429 body carrying a structured retry delay
pub fn gemini_rate_limited(retry_delay: &str) -> Value {
    json!({
        "error": {
            "code": 429,
            "message": "Resource has been exhausted (e.g. check quota).",
            "status": "RESOURCE_EXHAUSTED",
            "details": [
                { "@type": "type.googleapis.com/google.rpc.QuotaFailure", "violations": [] },
                { "@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": retry_delay }
            ]
        }
    })
}
