//! Agent error types.
//!
//! Inference failures surface through [`AgentError`].  Each variant carries
//! enough context for the pipeline to report the failure to the user before
//! terminating; nothing here is retried.

/// Unified error type for invitation generation.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- LLM errors ----------------------------------------------------------
    /// An HTTP request to the inference provider failed (network, auth,
    /// throttling or any non-success status).
    #[error("llm request failed: {reason}")]
    LlmRequestFailed { reason: String },

    /// The response body was not valid JSON.
    #[error("llm response parse error: {reason}")]
    LlmParseFailed { reason: String },

    /// The API key is missing for a provider that requires one.
    #[error("missing api key for provider: {provider}")]
    MissingApiKey { provider: String },

    // -- Configuration errors ------------------------------------------------
    /// Configuration validation failed (unknown provider, missing model id,
    /// malformed endpoint).
    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;
