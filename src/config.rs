//! Environment-driven configuration.

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::pipeline::DEFAULT_CONCURRENCY;

/// Where the mail-tool provider lives unless overridden.
const DEFAULT_MAIL_API_BASE: &str = "https://api.arcade.dev";

/// Configuration for one digest run.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// LLM backend/model/key for the classification capability.
    pub llm: LlmConfig,
    /// Base URL of the mail-tool provider API.
    pub mail_api_base: String,
    /// API key for the mail-tool provider.
    pub mail_api_key: SecretString,
    /// How many emails to classify concurrently.
    pub concurrency: usize,
}

impl DigestConfig {
    /// Build configuration from environment variables.
    ///
    /// Required: `MAIL_API_KEY`, plus the API key matching the selected
    /// backend (`OPENAI_API_KEY` or `ANTHROPIC_API_KEY`). Everything else
    /// has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match std::env::var("INBOX_DIGEST_LLM_BACKEND") {
            Ok(raw) => parse_backend(&raw)?,
            Err(_) => LlmBackend::OpenAi,
        };

        let model = std::env::var("INBOX_DIGEST_MODEL")
            .unwrap_or_else(|_| default_model(backend).to_string());

        let key_var = match backend {
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
        };
        let api_key = std::env::var(key_var)
            .map_err(|_| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let mail_api_base = std::env::var("MAIL_API_BASE")
            .unwrap_or_else(|_| DEFAULT_MAIL_API_BASE.to_string());
        let mail_api_key = std::env::var("MAIL_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("MAIL_API_KEY".to_string()))?;

        let concurrency = match std::env::var("INBOX_DIGEST_CONCURRENCY") {
            Ok(raw) => parse_concurrency(&raw)?,
            Err(_) => DEFAULT_CONCURRENCY,
        };

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key: SecretString::from(api_key),
                model,
            },
            mail_api_base,
            mail_api_key: SecretString::from(mail_api_key),
            concurrency,
        })
    }
}

fn parse_backend(raw: &str) -> Result<LlmBackend, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "openai" => Ok(LlmBackend::OpenAi),
        "anthropic" => Ok(LlmBackend::Anthropic),
        other => Err(ConfigError::InvalidValue {
            key: "INBOX_DIGEST_LLM_BACKEND".to_string(),
            message: format!("unknown backend '{other}' (expected openai or anthropic)"),
        }),
    }
}

fn default_model(backend: LlmBackend) -> &'static str {
    match backend {
        LlmBackend::OpenAi => "gpt-4o",
        LlmBackend::Anthropic => "claude-sonnet-4-20250514",
    }
}

fn parse_concurrency(raw: &str) -> Result<usize, ConfigError> {
    let parsed: usize = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: "INBOX_DIGEST_CONCURRENCY".to_string(),
        message: format!("'{raw}' is not a positive integer"),
    })?;
    if parsed == 0 {
        return Err(ConfigError::InvalidValue {
            key: "INBOX_DIGEST_CONCURRENCY".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(parsed)
}
