//! Adapter error types.
//!
//! Both external collaborators (browser and mail client) surface errors
//! through [`AdapterError`].  Each variant carries enough context for the
//! pipeline to decide whether the failure is fatal (page fetch) or merely
//! reported (draft composition).

/// Unified error type for invitegen adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// An I/O operation failed within the adapter.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// The adapter has not been connected yet.
    #[error("adapter `{adapter_id}` is not connected")]
    NotConnected { adapter_id: String },

    /// Input supplied to the adapter is invalid.
    #[error("invalid input for `{operation}`: {reason}")]
    InvalidInput { operation: String, reason: String },

    /// An operation against the external system failed.
    #[error("execution failed for `{operation}`: {reason}")]
    ExecutionFailed { operation: String, reason: String },

    /// The operation is not available on this host.
    #[error("`{operation}` is not supported on {platform}")]
    Unsupported { operation: String, platform: String },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// An operation exceeded its time limit.
    #[error("timeout after {seconds}s: {reason}")]
    Timeout { seconds: u64, reason: String },

    /// Configuration error in adapter setup.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Convenience alias used throughout the adapters crate.
pub type Result<T> = std::result::Result<T, AdapterError>;
