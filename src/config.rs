//! Configuration management for the portal assistant gateway
//!
//! Parses a TOML configuration file, applies environment overrides for provider
//! credentials, and validates the result once at startup.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default Gemini-style API root for the primary provider
pub const DEFAULT_PRIMARY_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default primary model
pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-1.5-flash";
/// Default OpenAI-compatible API root for the secondary provider
pub const DEFAULT_SECONDARY_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default secondary model
pub const DEFAULT_SECONDARY_MODEL: &str = "llama-3.1-8b-instant";

/// Upper bound for any outbound request timeout
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub records: RecordsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Timeout applied by every outbound HTTP client (providers and records)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// Secret string that never shows up in `Debug` output or serialized config
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Expose the raw key for building an outbound request
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Generation provider configuration
///
/// A provider section without an API key is treated as "not configured": the
/// gateway skips it rather than failing at request time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub primary: Option<PrimaryProviderConfig>,
    #[serde(default)]
    pub secondary: Option<SecondaryProviderConfig>,
}

/// Primary (Gemini-style) provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrimaryProviderConfig {
    #[serde(default = "default_primary_model")]
    model: String,
    #[serde(default = "default_primary_base_url")]
    base_url: String,
    #[serde(default, skip_serializing)]
    api_key: Option<ApiKey>,
}

impl Default for PrimaryProviderConfig {
    fn default() -> Self {
        Self {
            model: default_primary_model(),
            base_url: default_primary_base_url(),
            api_key: None,
        }
    }
}

impl PrimaryProviderConfig {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// API key, if one was supplied and is not blank
    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref().filter(|k| !k.is_blank())
    }
}

fn default_primary_model() -> String {
    DEFAULT_PRIMARY_MODEL.to_string()
}

fn default_primary_base_url() -> String {
    DEFAULT_PRIMARY_BASE_URL.to_string()
}

/// Secondary (OpenAI-compatible) provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecondaryProviderConfig {
    #[serde(default = "default_secondary_model")]
    model: String,
    #[serde(default = "default_secondary_base_url")]
    base_url: String,
    #[serde(default, skip_serializing)]
    api_key: Option<ApiKey>,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    temperature: f64,
}

impl Default for SecondaryProviderConfig {
    fn default() -> Self {
        Self {
            model: default_secondary_model(),
            base_url: default_secondary_base_url(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl SecondaryProviderConfig {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref().filter(|k| !k.is_blank())
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

fn default_secondary_model() -> String {
    DEFAULT_SECONDARY_MODEL.to_string()
}

fn default_secondary_base_url() -> String {
    DEFAULT_SECONDARY_BASE_URL.to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f64 {
    0.2
}

/// Exam-records collaborator configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecordsConfig {
    /// Fixed origin for the records service. When unset, the origin of the
    /// inbound request is used.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file, apply environment overrides and validate
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let mut config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .apply_env_overrides(|key| std::env::var(key).ok())
            .and_then(|()| config.validate())
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Overlay provider and records settings from the environment
    ///
    /// `lookup` is injected so tests can supply variables without touching the
    /// process environment. Setting any variable of a provider creates that
    /// provider's section with defaults if the file did not declare it.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("GEMINI_API_KEY") {
            self.providers
                .primary
                .get_or_insert_with(Default::default)
                .api_key = Some(ApiKey::new(key));
        }
        if let Some(model) = var("GEMINI_MODEL") {
            self.providers
                .primary
                .get_or_insert_with(Default::default)
                .model = model;
        }

        if let Some(key) = var("GROQ_API_KEY") {
            self.providers
                .secondary
                .get_or_insert_with(Default::default)
                .api_key = Some(ApiKey::new(key));
        }
        if let Some(model) = var("GROQ_MODEL") {
            self.providers
                .secondary
                .get_or_insert_with(Default::default)
                .model = model;
        }
        if let Some(raw) = var("GROQ_MAX_TOKENS") {
            let max_tokens = raw.trim().parse::<u32>().map_err(|e| {
                AppError::Config(format!("GROQ_MAX_TOKENS must be a positive integer, got '{}': {}", raw, e))
            })?;
            self.providers
                .secondary
                .get_or_insert_with(Default::default)
                .max_tokens = max_tokens;
        }
        if let Some(raw) = var("GROQ_TEMPERATURE") {
            let temperature = raw.trim().parse::<f64>().map_err(|e| {
                AppError::Config(format!("GROQ_TEMPERATURE must be a number, got '{}': {}", raw, e))
            })?;
            self.providers
                .secondary
                .get_or_insert_with(Default::default)
                .temperature = temperature;
        }

        if let Some(base_url) = var("RECORDS_BASE_URL") {
            self.records.base_url = Some(base_url);
        }

        Ok(())
    }

    /// Primary provider section, only when it carries an API key
    pub fn primary_provider(&self) -> Option<&PrimaryProviderConfig> {
        self.providers
            .primary
            .as_ref()
            .filter(|p| p.api_key().is_some())
    }

    /// Secondary provider section, only when it carries an API key
    pub fn secondary_provider(&self) -> Option<&SecondaryProviderConfig> {
        self.providers
            .secondary
            .as_ref()
            .filter(|p| p.api_key().is_some())
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()`; tests that build a `Config` from a TOML string
    /// call it explicitly.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.request_timeout_seconds == 0
            || self.server.request_timeout_seconds > MAX_TIMEOUT_SECONDS
        {
            return Err(AppError::Config(format!(
                "server.request_timeout_seconds must be in (0, {}], got {}",
                MAX_TIMEOUT_SECONDS, self.server.request_timeout_seconds
            )));
        }

        if let Some(primary) = &self.providers.primary {
            validate_model("providers.primary", &primary.model)?;
            validate_url("providers.primary.base_url", &primary.base_url)?;
        }

        if let Some(secondary) = &self.providers.secondary {
            validate_model("providers.secondary", &secondary.model)?;
            validate_url("providers.secondary.base_url", &secondary.base_url)?;

            if secondary.max_tokens == 0 {
                return Err(AppError::Config(
                    "providers.secondary.max_tokens must be greater than 0".to_string(),
                ));
            }
            if !secondary.temperature.is_finite()
                || !(0.0..=2.0).contains(&secondary.temperature)
            {
                return Err(AppError::Config(format!(
                    "providers.secondary.temperature must be a finite number between 0.0 and 2.0, got {}",
                    secondary.temperature
                )));
            }
        }

        if let Some(base_url) = &self.records.base_url {
            validate_url("records.base_url", base_url)?;
        }

        Ok(())
    }
}

fn validate_model(section: &str, model: &str) -> AppResult<()> {
    if model.trim().is_empty() {
        return Err(AppError::Config(format!("{}.model cannot be empty", section)));
    }
    Ok(())
}

fn validate_url(field: &str, url: &str) -> AppResult<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(AppError::Config(format!(
            "{} must start with 'http://' or 'https://', got '{}'",
            field, url
        )));
    }
    Ok(())
}
