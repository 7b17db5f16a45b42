//! Inference client for invitation generation.
//!
//! Supports three request shapes, selected by [`Provider`]:
//!
//! - **Bedrock Claude** -- `InvokeModel` with the Anthropic-on-Bedrock body
//!   (`anthropic_version`, `max_tokens`, `temperature`, typed text blocks).
//! - **Bedrock Nova** -- `InvokeModel` with the bare messages body used by
//!   the Nova model family (`content: [{"text": ...}]`).
//! - **Anthropic** -- the Anthropic Messages API called directly.
//!
//! Bedrock requests authenticate with a Bedrock API key sent as a bearer
//! token.  All shapes share one non-streaming round trip; the response is
//! handed to [`super::extract`] to pull out the generated text.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use crate::error::{AgentError, Result};
use crate::llm::extract::extract_generated_text;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default AWS region for Bedrock runtime calls.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default model for the Bedrock Claude request shape.
pub const DEFAULT_BEDROCK_CLAUDE_MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";

/// Default model for the direct Anthropic API.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";

/// Default Anthropic API base URL.
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// `anthropic_version` field required by Claude models on Bedrock.
const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Default maximum tokens per response.
const DEFAULT_MAX_TOKENS: u32 = 1500;

/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Overall HTTP timeout for a single inference call.
const REQUEST_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Provider enum
// ---------------------------------------------------------------------------

/// Identifies which inference API and request shape the client targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Claude on Amazon Bedrock (Anthropic request body).
    BedrockClaude,
    /// Nova on Amazon Bedrock (bare messages body).
    BedrockNova,
    /// Anthropic Messages API.
    Anthropic,
}

impl Provider {
    /// Every provider, in the order shown to users.
    pub const ALL: [Provider; 3] = [Self::BedrockClaude, Self::BedrockNova, Self::Anthropic];

    /// The configuration name of this provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BedrockClaude => "bedrock-claude",
            Self::BedrockNova => "bedrock-nova",
            Self::Anthropic => "anthropic",
        }
    }

    /// Whether requests go through Amazon Bedrock.
    pub fn is_bedrock(self) -> bool {
        matches!(self, Self::BedrockClaude | Self::BedrockNova)
    }

    /// The environment variable holding this provider's credential.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::BedrockClaude | Self::BedrockNova => "AWS_BEARER_TOKEN_BEDROCK",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// The model used when none is configured, if the provider has one.
    pub fn default_model(self) -> Option<&'static str> {
        match self {
            Self::BedrockClaude => Some(DEFAULT_BEDROCK_CLAUDE_MODEL),
            Self::BedrockNova => None,
            Self::Anthropic => Some(DEFAULT_ANTHROPIC_MODEL),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| AgentError::ConfigError {
                reason: format!(
                    "unknown provider `{s}`; expected one of: {}",
                    Self::ALL.map(Provider::as_str).join(", ")
                ),
            })
    }
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Configuration for a single inference endpoint.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Which API and request shape to use.
    pub provider: Provider,
    /// API key (Bedrock API key or Anthropic key).
    pub api_key: String,
    /// Model identifier; Bedrock model ids may contain `:`.
    pub model_id: String,
    /// AWS region for Bedrock endpoints.
    pub region: String,
    /// Optional base URL override (testing, proxies, VPC endpoints).
    pub base_url: Option<String>,
    /// Maximum tokens per response.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl InferenceConfig {
    /// Create a configuration with the provider's defaults.
    ///
    /// `model_id` may be empty for providers that have a default model.
    pub fn new(provider: Provider, api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        let mut model_id = model_id.into();
        if model_id.is_empty() {
            model_id = provider.default_model().unwrap_or_default().to_owned();
        }

        Self {
            provider,
            api_key: api_key.into(),
            model_id,
            region: DEFAULT_REGION.to_owned(),
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Claude on Bedrock with the default Haiku model.
    pub fn bedrock_claude(api_key: impl Into<String>) -> Self {
        Self::new(Provider::BedrockClaude, api_key, DEFAULT_BEDROCK_CLAUDE_MODEL)
    }

    /// Nova on Bedrock; the model id has no default.
    pub fn bedrock_nova(api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self::new(Provider::BedrockNova, api_key, model_id)
    }

    /// Direct Anthropic Messages API.
    pub fn anthropic(api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self::new(Provider::Anthropic, api_key, model_id)
    }

    /// Set the AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Override the endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Compute the full request URL.
    pub fn endpoint(&self) -> Result<String> {
        let base = match (&self.base_url, self.provider) {
            (Some(base), _) => base.clone(),
            (None, Provider::Anthropic) => ANTHROPIC_BASE_URL.to_owned(),
            (None, _) => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        };

        let mut url = url::Url::parse(&base).map_err(|e| AgentError::ConfigError {
            reason: format!("invalid base URL `{base}`: {e}"),
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|()| AgentError::ConfigError {
                reason: format!("base URL `{base}` cannot carry a path"),
            })?;
            segments.pop_if_empty();
            if self.provider.is_bedrock() {
                segments.extend(["model", self.model_id.as_str(), "invoke"]);
            } else {
                segments.extend(["v1", "messages"]);
            }
        }

        Ok(url.into())
    }

    /// Build the JSON request body for `prompt` in this provider's shape.
    pub fn build_request_body(&self, prompt: &str) -> Value {
        match self.provider {
            Provider::BedrockClaude => json!({
                "anthropic_version": BEDROCK_ANTHROPIC_VERSION,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "messages": [{
                    "role": "user",
                    "content": [{"type": "text", "text": prompt}],
                }],
            }),
            Provider::BedrockNova => json!({
                "messages": [{
                    "role": "user",
                    "content": [{"text": prompt}],
                }],
            }),
            Provider::Anthropic => json!({
                "model": self.model_id,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "messages": [{
                    "role": "user",
                    "content": prompt,
                }],
            }),
        }
    }

    /// Build the request headers for this provider.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        if self.provider.is_bedrock() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|e| {
                    AgentError::LlmRequestFailed {
                        reason: format!("invalid authorization header: {e}"),
                    }
                })?,
            );
        } else {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(&self.api_key).map_err(|e| {
                    AgentError::LlmRequestFailed {
                        reason: format!("invalid API key header: {e}"),
                    }
                })?,
            );
            headers.insert(
                "anthropic-version",
                HeaderValue::from_static(ANTHROPIC_VERSION),
            );
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A non-streaming inference client bound to one [`InferenceConfig`].
#[derive(Debug, Clone)]
pub struct InferenceClient {
    config: Arc<InferenceConfig>,
    http: reqwest::Client,
}

impl InferenceClient {
    /// Create a new client, validating the configuration.
    pub fn new(config: InferenceConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AgentError::MissingApiKey {
                provider: config.provider.to_string(),
            });
        }

        if config.model_id.trim().is_empty() {
            return Err(AgentError::ConfigError {
                reason: format!("model_id is required for provider `{}`", config.provider),
            });
        }

        // Surface endpoint problems at construction time.
        config.endpoint()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Send `prompt` and return the raw JSON response body.
    ///
    /// Any transport error, non-success status or non-JSON body is an error.
    pub async fn invoke(&self, prompt: &str) -> Result<Value> {
        let url = self.config.endpoint()?;
        let body = self.config.build_request_body(prompt);

        tracing::debug!(
            url = %url,
            provider = %self.config.provider,
            model = %self.config.model_id,
            prompt_len = prompt.len(),
            "sending inference request"
        );

        let resp = self
            .http
            .post(&url)
            .headers(self.config.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(AgentError::LlmRequestFailed {
                reason: format!("API returned {status}: {}", api_error_message(&text)),
            });
        }

        let v: Value = serde_json::from_str(&text).map_err(|e| AgentError::LlmParseFailed {
            reason: format!("invalid JSON response: {e}"),
        })?;

        tracing::debug!(response = %v, "raw inference response");
        Ok(v)
    }

    /// Send `prompt` and return the generated text.
    ///
    /// An unrecognised response shape yields an empty string.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let body = self.invoke(prompt).await?;
        Ok(extract_generated_text(&body))
    }
}

/// Pull a human-readable message out of an API error body.
///
/// Bedrock answers `{"message": ...}`, Anthropic answers
/// `{"error": {"message": ...}}`; anything else is returned verbatim.
fn api_error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("Message"))
                .or_else(|| v.get("error").and_then(|e| e.get("message")))
                .and_then(Value::as_str)
        })
        .map(str::to_owned)
        .unwrap_or_else(|| body.to_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trips_through_names() {
        for provider in Provider::ALL {
            assert_eq!(provider.as_str().parse::<Provider>().unwrap(), provider);
        }
        assert_eq!(" Bedrock-Nova ".parse::<Provider>().unwrap(), Provider::BedrockNova);
    }

    #[test]
    fn unknown_provider_is_config_error() {
        let err = "openai".parse::<Provider>().unwrap_err();
        assert!(matches!(err, AgentError::ConfigError { .. }));
        assert!(err.to_string().contains("bedrock-claude"));
    }

    #[test]
    fn bedrock_claude_body_shape() {
        let config = InferenceConfig::bedrock_claude("key");
        let body = config.build_request_body("hello");

        assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(body["max_tokens"], 1500);
        let temp = body["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 1e-6, "temperature was {temp}");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["type"], "text");
        assert_eq!(body["messages"][0]["content"][0]["text"], "hello");
        assert!(body.get("model").is_none());
    }

    #[test]
    fn bedrock_nova_body_shape() {
        let config = InferenceConfig::bedrock_nova("key", "us.amazon.nova-premier-v1:0");
        let body = config.build_request_body("hello");

        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["text"], "hello");
        assert!(body["messages"][0]["content"][0].get("type").is_none());
        assert!(body.get("anthropic_version").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn anthropic_body_shape() {
        let config = InferenceConfig::anthropic("key", "claude-test").with_max_tokens(800);
        let body = config.build_request_body("hello");

        assert_eq!(body["model"], "claude-test");
        assert_eq!(body["max_tokens"], 800);
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[test]
    fn bedrock_endpoint_uses_region_and_model() {
        let config = InferenceConfig::bedrock_claude("key").with_region("eu-west-1");
        let endpoint = config.endpoint().unwrap();
        assert!(endpoint.starts_with("https://bedrock-runtime.eu-west-1.amazonaws.com/model/"));
        assert!(endpoint.contains("anthropic.claude-3-haiku-20240307-v1"));
        assert!(endpoint.ends_with("/invoke"));
    }

    #[test]
    fn anthropic_endpoint_and_base_url_override() {
        let config = InferenceConfig::anthropic("key", "");
        assert_eq!(config.endpoint().unwrap(), "https://api.anthropic.com/v1/messages");

        let config = InferenceConfig::bedrock_nova("key", "nova").with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.endpoint().unwrap(), "http://127.0.0.1:9000/model/nova/invoke");
    }

    #[test]
    fn empty_model_falls_back_to_provider_default() {
        assert_eq!(InferenceConfig::anthropic("key", "").model_id, DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(InferenceConfig::bedrock_nova("key", "").model_id, "");
    }

    #[test]
    fn empty_api_key_returns_error() {
        let result = InferenceClient::new(InferenceConfig::bedrock_claude(""));
        assert!(matches!(result, Err(AgentError::MissingApiKey { .. })));
    }

    #[test]
    fn nova_without_model_is_config_error() {
        let result = InferenceClient::new(InferenceConfig::bedrock_nova("key", ""));
        assert!(matches!(result, Err(AgentError::ConfigError { .. })));
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let config = InferenceConfig::bedrock_claude("key").with_base_url("not a url");
        assert!(matches!(
            InferenceClient::new(config),
            Err(AgentError::ConfigError { .. })
        ));
    }

    #[test]
    fn headers_per_provider() {
        let bedrock = InferenceConfig::bedrock_claude("abc").headers().unwrap();
        assert_eq!(bedrock[AUTHORIZATION], "Bearer abc");
        assert!(bedrock.get("x-api-key").is_none());

        let anthropic = InferenceConfig::anthropic("xyz", "m").headers().unwrap();
        assert_eq!(anthropic["x-api-key"], "xyz");
        assert_eq!(anthropic["anthropic-version"], ANTHROPIC_VERSION);
        assert!(anthropic.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn api_error_message_shapes() {
        assert_eq!(api_error_message(r#"{"message":"Throttled"}"#), "Throttled");
        assert_eq!(
            api_error_message(r#"{"error":{"type":"auth","message":"bad key"}}"#),
            "bad key"
        );
        assert_eq!(api_error_message("plain failure"), "plain failure");
    }
}
