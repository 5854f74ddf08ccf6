//! Health check endpoint
//!
//! Reports liveness plus which generation providers were configured at startup.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    pub primary_configured: bool,
    pub secondary_configured: bool,
}

/// Health check handler
///
/// Always 200 while the process is serving; a gateway without providers is
/// still "up", it just cannot answer chat requests.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            primary_configured: state.gateway().has_primary(),
            secondary_configured: state.gateway().has_secondary(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::Arc;

    fn create_test_state(providers: &str) -> AppState {
        let toml = format!(
            r#"
[server]
host = "127.0.0.1"
port = 3000

{}
"#,
            providers
        );
        let config: Config = toml::from_str(&toml).expect("should parse test config");
        AppState::new(Arc::new(config)).expect("should create AppState")
    }

    #[tokio::test]
    async fn test_health_handler_returns_ok_without_providers() {
        let (status, Json(body)) = handler(State(create_test_state(""))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "OK");
        assert!(!body.primary_configured);
        assert!(!body.secondary_configured);
    }

    #[tokio::test]
    async fn test_health_handler_reports_primary() {
        let state = create_test_state(
            r#"
[providers.primary]
api_key = "k"
"#,
        );
        let (_, Json(body)) = handler(State(state)).await;
        assert!(body.primary_configured);
        assert!(!body.secondary_configured);
    }
}
