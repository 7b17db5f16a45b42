//! Runtime configuration.
//!
//! Reads the `[llm]`, `[browser]` and `[mail]` sections of
//! `config/default.toml`.  Every key is optional.  Values are layered as:
//! command-line flag, then environment, then file, then built-in default.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use invitegen_adapters::{BrowserFetcher, MailBackend};
use invitegen_agent::{InferenceConfig, Provider};

use crate::cli::Cli;

/// Environment variable selecting the inference backend.
pub const ENV_PROVIDER: &str = "INVITEGEN_PROVIDER";
/// Environment variable selecting the model id.
pub const ENV_MODEL_ID: &str = "INVITEGEN_MODEL_ID";
/// Environment variable selecting the AWS region.
pub const ENV_REGION: &str = "AWS_REGION";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The `[llm]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: String,
    /// Empty means the provider's default model.
    pub model_id: String,
    pub region: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Endpoint override (VPC endpoints, proxies).
    pub base_url: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: Provider::BedrockClaude.as_str().to_owned(),
            model_id: String::new(),
            region: "us-east-1".to_owned(),
            max_tokens: 1500,
            temperature: 0.7,
            base_url: None,
        }
    }
}

/// The `[browser]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub debug_port: u16,
    pub chrome_path: Option<String>,
    pub settle_delay_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            debug_port: invitegen_adapters::browser::DEFAULT_DEBUG_PORT,
            chrome_path: None,
            settle_delay_ms: invitegen_adapters::browser::DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

/// The `[mail]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub backend: String,
    pub default_recipient: Option<String>,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            backend: MailBackend::Outlook.as_str().to_owned(),
            default_recipient: None,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSettings,
    pub browser: BrowserSettings,
    pub mail: MailSettings,
}

impl AppConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file; using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read config `{}`", path.display()));
            }
        };

        let config = Self::from_toml(&content)
            .with_context(|| format!("failed to parse config `{}`", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = non_empty(ENV_PROVIDER) {
            self.llm.provider = provider;
        }
        if let Some(model_id) = non_empty(ENV_MODEL_ID) {
            self.llm.model_id = model_id;
        }
        if let Some(region) = non_empty(ENV_REGION) {
            self.llm.region = region;
        }
    }

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref provider) = cli.provider {
            self.llm.provider = provider.clone();
        }
        if let Some(ref model_id) = cli.model_id {
            self.llm.model_id = model_id.clone();
        }
        if let Some(ref region) = cli.region {
            self.llm.region = region.clone();
        }
        if let Some(delay) = cli.settle_delay_ms {
            self.browser.settle_delay_ms = delay;
        }
    }

    /// The configured inference backend.
    pub fn provider(&self) -> Result<Provider> {
        Ok(self.llm.provider.parse::<Provider>()?)
    }

    /// Build the inference configuration, reading the API key through `lookup`.
    pub fn inference_config(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<InferenceConfig> {
        let provider = self.provider()?;
        let api_key = lookup(provider.api_key_env()).unwrap_or_default();

        let mut config = InferenceConfig::new(provider, api_key, self.llm.model_id.trim())
            .with_region(self.llm.region.trim())
            .with_max_tokens(self.llm.max_tokens)
            .with_temperature(self.llm.temperature);
        if let Some(ref base_url) = self.llm.base_url {
            config = config.with_base_url(base_url.trim());
        }
        Ok(config)
    }

    /// The configured mail backend.
    pub fn mail_backend(&self) -> Result<MailBackend> {
        Ok(self.mail.backend.parse::<MailBackend>()?)
    }

    /// Build the page fetcher described by `[browser]`.
    pub fn browser_fetcher(&self) -> BrowserFetcher {
        let mut fetcher = BrowserFetcher::with_port("browser", self.browser.debug_port)
            .with_settle_delay(Duration::from_millis(self.browser.settle_delay_ms));
        if let Some(ref path) = self.browser.chrome_path {
            fetcher = fetcher.with_chrome_path(path.clone());
        }
        fetcher
    }

    /// The draft recipient: an explicit address wins over the configured one.
    pub fn recipient(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .or(self.mail.default_recipient.as_deref())
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_owned)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.llm.provider, "bedrock-claude");
        assert_eq!(config.llm.max_tokens, 1500);
        assert_eq!(config.browser.debug_port, 9222);
        assert_eq!(config.browser.settle_delay_ms, 5000);
        assert_eq!(config.mail_backend().unwrap(), MailBackend::Outlook);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [llm]
            provider = "bedrock-nova"
            model_id = "us.amazon.nova-premier-v1:0"

            [mail]
            backend = "disabled"
            "#,
        )
        .unwrap();
        assert_eq!(config.provider().unwrap(), Provider::BedrockNova);
        assert_eq!(config.llm.model_id, "us.amazon.nova-premier-v1:0");
        assert_eq!(config.llm.region, "us-east-1");
        assert_eq!(config.browser, BrowserSettings::default());
        assert_eq!(config.mail_backend().unwrap(), MailBackend::Disabled);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.toml");
        std::fs::write(&path, "[browser]\nsettle_delay_ms = 250\ndebug_port = 9333\n").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.browser.settle_delay_ms, 250);
        assert_eq!(config.browser.debug_port, 9333);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.toml");
        std::fs::write(&path, "[llm\nprovider = ").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn precedence_cli_over_env_over_file() {
        let mut config = AppConfig::from_toml(
            "[llm]\nprovider = \"anthropic\"\nmodel_id = \"file-model\"\nregion = \"file-region\"\n",
        )
        .unwrap();

        config.apply_env(env(&[
            (ENV_MODEL_ID, "env-model"),
            (ENV_REGION, "env-region"),
            (ENV_PROVIDER, "  "),
        ]));
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.model_id, "env-model");
        assert_eq!(config.llm.region, "env-region");

        let cli = Cli::try_parse_from([
            "invitegen",
            "https://example.com",
            "--region",
            "cli-region",
            "--settle-delay-ms",
            "0",
        ])
        .unwrap();
        config.apply_cli(&cli);
        assert_eq!(config.llm.model_id, "env-model");
        assert_eq!(config.llm.region, "cli-region");
        assert_eq!(config.browser.settle_delay_ms, 0);
    }

    #[test]
    fn inference_config_reads_provider_key() {
        let mut config = AppConfig::default();
        config.llm.region = "eu-central-1".into();
        let inference = config
            .inference_config(env(&[("AWS_BEARER_TOKEN_BEDROCK", "bedrock-key")]))
            .unwrap();
        assert_eq!(inference.provider, Provider::BedrockClaude);
        assert_eq!(inference.api_key, "bedrock-key");
        assert_eq!(
            inference.model_id,
            "anthropic.claude-3-haiku-20240307-v1:0"
        );
        assert_eq!(inference.region, "eu-central-1");
        assert_eq!(inference.max_tokens, 1500);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let mut config = AppConfig::default();
        config.llm.provider = "openai".into();
        assert!(config.inference_config(env(&[])).is_err());
    }

    #[test]
    fn unknown_mail_backend_is_rejected() {
        let mut config = AppConfig::default();
        config.mail.backend = "thunderbird".into();
        assert!(config.mail_backend().is_err());
    }

    #[test]
    fn recipient_prefers_explicit_address() {
        let mut config = AppConfig::default();
        assert_eq!(config.recipient(None), None);

        config.mail.default_recipient = Some("team@example.com".into());
        assert_eq!(config.recipient(None).as_deref(), Some("team@example.com"));
        assert_eq!(
            config.recipient(Some(" me@example.com ")).as_deref(),
            Some("me@example.com")
        );
        assert_eq!(config.recipient(Some("  ")), None);
    }
}
