//! The "generate invitation text from raw page text" capability.
//!
//! The pipeline depends only on [`InvitationGenerator`]; which inference API
//! backs it is decided by configuration when the generator is built.

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::{InferenceClient, InferenceConfig};
use crate::prompt::build_prompt;

/// Turns raw event page text into invitation-dialect text.
#[async_trait]
pub trait InvitationGenerator: Send + Sync {
    /// Short description of the backend, for logs.
    fn describe(&self) -> String;

    /// Generate the invitation.
    ///
    /// An empty string means the backend answered in a shape that carried no
    /// recognisable text; transport and API failures are errors.
    async fn generate(&self, raw_text: &str) -> Result<String>;
}

/// Generator backed by a hosted language model.
#[derive(Debug, Clone)]
pub struct LlmInvitationGenerator {
    client: InferenceClient,
}

impl LlmInvitationGenerator {
    /// Wrap an existing client.
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }

    /// Build a generator straight from configuration.
    pub fn from_config(config: InferenceConfig) -> Result<Self> {
        Ok(Self::new(InferenceClient::new(config)?))
    }
}

#[async_trait]
impl InvitationGenerator for LlmInvitationGenerator {
    fn describe(&self) -> String {
        let config = self.client.config();
        format!("{} ({})", config.provider, config.model_id)
    }

    async fn generate(&self, raw_text: &str) -> Result<String> {
        let prompt = build_prompt(raw_text);
        let text = self.client.complete(&prompt).await?;

        if text.is_empty() {
            tracing::warn!(
                backend = %self.describe(),
                "inference response carried no recognisable text"
            );
        } else {
            tracing::debug!(chars = text.chars().count(), "invitation generated");
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;

    #[test]
    fn describe_names_provider_and_model() {
        let generator =
            LlmInvitationGenerator::from_config(InferenceConfig::bedrock_nova("k", "nova-x"))
                .unwrap();
        assert_eq!(generator.describe(), "bedrock-nova (nova-x)");
    }

    #[test]
    fn from_config_propagates_validation_errors() {
        let config = InferenceConfig::new(Provider::Anthropic, "", "m");
        assert!(LlmInvitationGenerator::from_config(config).is_err());
    }
}
