//! Adapter traits and supporting types.
//!
//! [`Adapter`] is the lifecycle of collaborators that own an external
//! process or connection.  The pipeline itself only sees the capability
//! traits [`PageFetcher`] and [`DraftComposer`], so test doubles or other
//! backends can be substituted without touching it.

use async_trait::async_trait;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// The health status of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// The adapter is fully operational.
    Healthy,
    /// The adapter is working but its backing service did not answer.
    Degraded,
    /// The adapter is not functional.
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// An unsent mail message handed to a [`DraftComposer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Subject line.
    pub subject: String,
    /// Complete HTML document used as the message body.
    pub html_body: String,
    /// Optional single recipient address.
    pub recipient: Option<String>,
}

impl Draft {
    /// Create a draft without a recipient.
    pub fn new(subject: impl Into<String>, html_body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            html_body: html_body.into(),
            recipient: None,
        }
    }

    /// Pre-populate the recipient; blank addresses are ignored.
    pub fn with_recipient(mut self, recipient: Option<impl Into<String>>) -> Self {
        self.recipient = recipient
            .map(Into::into)
            .map(|r: String| r.trim().to_owned())
            .filter(|r| !r.is_empty());
        self
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Lifecycle shared by adapters that talk to an external system.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Return the unique identifier for this adapter instance.
    fn id(&self) -> &str;

    /// Establish a connection to the backing service.
    async fn connect(&mut self) -> Result<()>;

    /// Gracefully disconnect from the backing service.
    async fn disconnect(&mut self) -> Result<()>;

    /// Check whether the adapter is healthy and operational.
    async fn health_check(&self) -> Result<HealthStatus>;
}

/// Loads a page and returns its visible text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the visible body text of `url`.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Creates an unsent draft in a mail client.
#[async_trait]
pub trait DraftComposer: Send + Sync {
    /// Short name of the backend, for logs.
    fn name(&self) -> &str;

    /// Create the draft.  Nothing is sent.
    async fn compose(&self, draft: &Draft) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_recipient_is_trimmed_and_blank_dropped() {
        let draft = Draft::new("s", "<html></html>").with_recipient(Some(" a@b.c "));
        assert_eq!(draft.recipient.as_deref(), Some("a@b.c"));

        let draft = Draft::new("s", "b").with_recipient(Some("   "));
        assert!(draft.recipient.is_none());

        let draft = Draft::new("s", "b").with_recipient(None::<String>);
        assert!(draft.recipient.is_none());
    }

    #[test]
    fn health_status_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "healthy");
        assert_eq!(HealthStatus::Degraded.to_string(), "degraded");
        assert_eq!(HealthStatus::Unhealthy.to_string(), "unhealthy");
    }
}
