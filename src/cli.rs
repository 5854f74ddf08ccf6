//! Command-line interface for portal-assist
//!
//! Provides argument parsing and subcommand handling for the server binary.

use clap::{Parser, Subcommand};

/// Chat-completion gateway for the college portal
#[derive(Parser)]
#[command(name = "portal-assist")]
#[command(version)]
#[command(about = "Chat-completion gateway for the college portal")]
#[command(
    long_about = "portal-assist answers student chat questions and summarises exam results \
    through a primary generation provider, falling back to a secondary provider on failure."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# portal-assist Configuration
# ===========================
#
# API keys can be left out of this file and supplied through the environment:
#   GEMINI_API_KEY, GEMINI_MODEL
#   GROQ_API_KEY, GROQ_MODEL, GROQ_MAX_TOKENS, GROQ_TEMPERATURE
#   RECORDS_BASE_URL

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# Timeout for every outbound call (providers and exam records), 1-300 seconds
request_timeout_seconds = 30

# ─────────────────────────────────────────────────────────────────────────────
# GENERATION PROVIDERS
# ─────────────────────────────────────────────────────────────────────────────
#
# The primary provider is tried first. Any failure other than a rate limit
# falls back to the secondary provider. A provider without an API key is
# treated as not configured.

[providers.primary]
model = "gemini-1.5-flash"
base_url = "https://generativelanguage.googleapis.com/v1beta"
# api_key = "your-gemini-key"

[providers.secondary]
model = "llama-3.1-8b-instant"
base_url = "https://api.groq.com/openai/v1"
max_tokens = 1024
temperature = 0.2
# api_key = "your-groq-key"

# ─────────────────────────────────────────────────────────────────────────────
# EXAM RECORDS
# ─────────────────────────────────────────────────────────────────────────────

[records]
# Origin of the portal's exam records API. When unset, the host of the
# inbound /exam-summary request is used.
# base_url = "http://localhost:5000"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
log_level = "info"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["portal-assist"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["portal-assist", "--config", "custom.toml"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["portal-assist", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "my-config.toml"
        ));
    }

    #[test]
    fn template_parses_and_validates() {
        let config: Config =
            toml::from_str(generate_config_template()).expect("template should be valid config");
        config.validate().expect("template should validate");

        // Keys are commented out, so nothing is callable yet
        assert!(config.primary_provider().is_none());
        assert!(config.secondary_provider().is_none());
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        for section in [
            "[server]",
            "[providers.primary]",
            "[providers.secondary]",
            "[records]",
            "[observability]",
        ] {
            assert!(template.contains(section), "missing {}", section);
        }
    }
}
