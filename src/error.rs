//! Error types for inbox-digest.

/// Top-level error type for a digest run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mail gateway error: {0}")]
    Mail(#[from] MailError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mail provider errors.
///
/// Authorization and retrieval failures are fatal before any email is
/// dispatched; a delivery failure is fatal after the report is already
/// built (the report itself is not lost, only its delivery).
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Authorization handshake {auth_id} did not reach completed status")]
    AuthorizationIncomplete { auth_id: String },

    #[error("Email retrieval failed: {0}")]
    Retrieval(String),

    #[error("Digest delivery failed: {0}")]
    Delivery(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid response from mail provider: {0}")]
    InvalidResponse(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-email classification errors.
///
/// Isolated to the email they occur on — the orchestrator never lets one
/// cross the item-task boundary into the rest of the batch.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("{task} classification call failed: {source}")]
    Capability {
        task: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("Malformed {task} response: {reason}")]
    MalformedResponse { task: &'static str, reason: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
