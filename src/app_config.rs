use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;
use std::path::Path;

use crate::errors::ConfigError;
use crate::providers::ProviderId;

/// Application configuration module
/// This module handles the persisted settings record: which provider is the
/// default, the per-provider credentials and models, and the ambient options
/// (target language, log level, mock mode). Requests never read this record
/// directly; they receive a resolved `ProviderConfig` snapshot.
/// Target language used when nothing else is configured
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

/// Key the self-hosted provider is stored under in older records
pub const CUSTOM_PROVIDER_KEY: &str = "custom";

/// Persisted configuration record
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Online providers or a local endpoint; unset until first configured
    #[serde(default)]
    pub mode: Option<Mode>,

    /// Key of the provider used when a request does not name one
    #[serde(default = "default_provider_key")]
    pub default_provider: String,

    /// Per-provider settings keyed by provider key
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderEntry>,

    /// ISO code of the translation target
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Mock dispatcher settings
    #[serde(default)]
    pub mock: MockConfig,
}

/// Where requests go
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Online,
    Local,
}

/// Stored settings for one provider
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEntry {
    /// Display name shown in the settings screen
    #[serde(default)]
    pub name: String,

    /// API key
    #[serde(default)]
    pub api_key: String,

    /// Model name; empty means the registry default
    #[serde(default)]
    pub model: String,

    /// Endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl ProviderEntry {
    // @param id: Provider the entry is for
    // @returns: Entry with the registry defaults and no key
    pub fn new(id: ProviderId) -> Self {
        Self {
            name: id.display_name().to_string(),
            api_key: String::new(),
            model: id.default_model().to_string(),
            endpoint: None,
        }
    }
}

/// Fully resolved provider settings for one request
#[derive(Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Provider to route to
    #[serde(default, alias = "provider")]
    pub provider_id: ProviderId,

    /// API key; may be empty only for the local provider
    #[serde(default)]
    pub api_key: String,

    /// Model name; empty means the registry default
    #[serde(default)]
    pub model: String,

    /// Endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl ProviderConfig {
    /// Config with registry defaults and no credentials
    pub fn new(provider_id: ProviderId) -> Self {
        Self {
            provider_id,
            ..Default::default()
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the endpoint override
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Configured model, or the provider's default
    pub fn model_or_default(&self) -> &str {
        if self.model.trim().is_empty() {
            self.provider_id.default_model()
        } else {
            &self.model
        }
    }

    /// Endpoint override, or the provider's registry endpoint
    pub fn endpoint_or_default(&self) -> &str {
        match self.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint,
            _ => self.provider_id.endpoint(),
        }
    }
}

// API keys stay out of debug output and logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider_id", &self.provider_id)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Mock dispatcher settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MockConfig {
    /// Serve canned responses instead of calling providers
    #[serde(default)]
    pub enabled: bool,

    /// Minimum delay between streamed words in milliseconds
    #[serde(default = "default_mock_delay_min_ms")]
    pub delay_min_ms: u64,

    /// Maximum delay between streamed words in milliseconds
    #[serde(default = "default_mock_delay_max_ms")]
    pub delay_max_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_min_ms: default_mock_delay_min_ms(),
            delay_max_ms: default_mock_delay_max_ms(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn as_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_provider_key() -> String {
    ProviderId::Local.as_str().to_string()
}

fn default_target_language() -> String {
    DEFAULT_TARGET_LANGUAGE.to_string()
}

fn default_mock_delay_min_ms() -> u64 {
    50
}

fn default_mock_delay_max_ms() -> u64 {
    150
}

impl Config {
    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load a configuration file, writing the defaults first if it does not exist
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Stored entry for a provider, if any
    ///
    /// The local provider may also be stored under the `custom` key.
    pub fn provider_entry(&self, id: ProviderId) -> Option<&ProviderEntry> {
        self.providers.get(id.as_str()).or_else(|| match id {
            ProviderId::Local => self.providers.get(CUSTOM_PROVIDER_KEY),
            _ => None,
        })
    }

    /// Resolve the provider a request should use
    ///
    /// Local mode always resolves to the local provider. Otherwise the
    /// override wins over `defaultProvider`. A provider without a stored entry
    /// resolves to the local provider with empty credentials.
    pub fn resolve_provider(&self, provider_override: Option<ProviderId>) -> ProviderConfig {
        let id = match self.mode {
            Some(Mode::Local) => ProviderId::Local,
            _ => provider_override.unwrap_or_else(|| ProviderId::lookup(&self.default_provider)),
        };

        match self.provider_entry(id) {
            Some(entry) => ProviderConfig {
                provider_id: id,
                api_key: entry.api_key.clone(),
                model: entry.model.clone(),
                endpoint: entry.endpoint.clone(),
            },
            None if id == ProviderId::Local => ProviderConfig::new(ProviderId::Local),
            None => {
                log::warn!("No configuration stored for {}, falling back to the local provider", id);
                ProviderConfig::new(ProviderId::Local)
            }
        }
    }

    /// Validate the configuration for the default provider
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.validate_for(None)
    }

    /// Validate the configuration for the provider a request would resolve to
    pub fn validate_for(&self, provider_override: Option<ProviderId>) -> std::result::Result<(), ConfigError> {
        if crate::language_utils::validate_language_code(&self.target_language).is_err() {
            return Err(ConfigError::InvalidLanguage(self.target_language.clone()));
        }

        if self.mock.delay_min_ms > self.mock.delay_max_ms {
            return Err(ConfigError::InvalidMockDelay {
                min: self.mock.delay_min_ms,
                max: self.mock.delay_max_ms,
            });
        }

        for (key, entry) in &self.providers {
            if let Some(endpoint) = &entry.endpoint {
                url::Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
                    provider: key.clone(),
                    reason: e.to_string(),
                })?;
            }
        }

        // Mock mode never sends credentials anywhere
        if self.mock.enabled {
            return Ok(());
        }

        let resolved = self.resolve_provider(provider_override);
        if resolved.provider_id.requires_api_key() && resolved.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey(resolved.provider_id.display_name().to_string()));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        let providers = ProviderId::ALL
            .iter()
            .map(|id| (id.as_str().to_string(), ProviderEntry::new(*id)))
            .collect();

        Config {
            mode: None,
            default_provider: default_provider_key(),
            providers,
            target_language: default_target_language(),
            log_level: LogLevel::default(),
            mock: MockConfig::default(),
        }
    }
}
