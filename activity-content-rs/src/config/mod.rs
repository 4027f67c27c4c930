//! Configuration management for the pipeline
//!
//! This module provides utilities for loading and validating configuration
//! from environment variables or static values:
//! - [`ConfigProvider`] implementations (environment, memory, composite)
//! - [`PipelineConfig`] for timeouts, retries, breaker, cache and regeneration
//! - [`OpenAIConfig`] for the OpenAI-compatible generation client

mod pipeline;

pub use pipeline::PipelineConfig;

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::util::parse_duration;

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.trim().parse::<i64>().map_err(|e| {
            GenerationError::configuration(format!("Invalid integer for key {}: {}", key, e))
        })
    }

    /// Get a float configuration value
    fn get_float(&self, key: &str) -> Result<f64> {
        let value = self.get_string(key)?;
        value.trim().parse::<f64>().map_err(|e| {
            GenerationError::configuration(format!("Invalid float for key {}: {}", key, e))
        })
    }

    /// Get a duration such as `500ms`, `30s`, `5m` or `1h`
    fn get_duration(&self, key: &str) -> Result<Duration> {
        let value = self.get_string(key)?;
        parse_duration(&value).ok_or_else(|| {
            GenerationError::configuration(format!("Invalid duration for key {}: {}", key, value))
        })
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an integer configuration value with a default
    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Get a float configuration value with a default
    fn get_float_or(&self, key: &str, default: f64) -> f64 {
        self.get_float(key).unwrap_or(default)
    }

    fn get_duration_or(&self, key: &str, default: Duration) -> Duration {
        self.get_duration(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,

    /// Optional namespace for variables (e.g., "OPENAI", "CACHE")
    namespace: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set a namespace for environment variables
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Format a configuration key as an environment variable
    pub(crate) fn format_key(&self, key: &str) -> String {
        let parts = [self.prefix.as_deref(), self.namespace.as_deref()];
        let mut env_key: String = parts
            .iter()
            .flatten()
            .map(|part| format!("{}_", part.to_uppercase()))
            .collect();

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));
        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => GenerationError::configuration(format!(
                "Environment variable not set: {}",
                env_key
            )),
            env::VarError::NotUnicode(_) => GenerationError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for MemoryConfigProvider {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut provider = Self::new();
        for (key, value) in iter {
            provider.set(key, value);
        }
        provider
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values.get(key).cloned().ok_or_else(|| {
            GenerationError::configuration(format!("Configuration key not found: {}", key))
        })
    }
}

/// A composite config provider that tries multiple providers in order
#[derive(Default)]
pub struct CompositeConfigProvider {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    /// Create a new composite config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider to the end of the chain
    pub fn add_provider(&mut self, provider: impl ConfigProvider + 'static) {
        self.providers.push(Box::new(provider));
    }

    /// Builder-style variant of [`CompositeConfigProvider::add_provider`]
    pub fn with_provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.add_provider(provider);
        self
    }
}

impl ConfigProvider for CompositeConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.providers
            .iter()
            .find_map(|provider| provider.get_string(key).ok())
            .ok_or_else(|| {
                GenerationError::configuration(format!(
                    "Configuration key not found in any provider: {}",
                    key
                ))
            })
    }
}

/// Global default configuration provider, reading `ACTIVITY_*` variables
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("ACTIVITY")));

/// A validated configuration section
pub trait ConfigSection: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Section name used in error messages
    fn section_name(&self) -> &str;
}

/// Configuration for the OpenAI-compatible generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key
    pub api_key: String,

    /// Organization ID (optional)
    pub org_id: Option<String>,

    /// Base URL (can be changed for proxies and compatible services)
    pub base_url: String,

    /// Chat model used for generation
    pub model: String,

    /// HTTP timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            org_id: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl OpenAIConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self::overlay_provider(provider);
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with whichever keys the provider has, unvalidated
    pub fn overlay_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Self {
        let defaults = Self::default();
        Self {
            api_key: provider.get_string_or("openai_api_key", &defaults.api_key),
            org_id: provider.get_string("openai_org_id").ok(),
            base_url: provider.get_string_or("openai_base_url", &defaults.base_url),
            model: provider.get_string_or("openai_model", &defaults.model),
            timeout_seconds: provider
                .get_int_or("openai_timeout_seconds", defaults.timeout_seconds as i64)
                .max(1) as u64,
        }
    }
}

impl ConfigSection for OpenAIConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(GenerationError::configuration("OpenAI API key is required"));
        }

        if let Err(e) = url::Url::parse(&self.base_url) {
            return Err(GenerationError::configuration(format!(
                "Invalid OpenAI base URL '{}': {}",
                self.base_url, e
            )));
        }

        if self.model.trim().is_empty() {
            return Err(GenerationError::configuration("OpenAI model is required"));
        }

        if self.timeout_seconds == 0 {
            return Err(GenerationError::configuration("OpenAI timeout must be positive"));
        }

        Ok(())
    }

    fn section_name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("key1", "value1");
        provider.set("key2", "123");
        provider.set("key3", "250ms");

        assert_eq!(provider.get_string("key1").unwrap(), "value1");
        assert_eq!(provider.get_int("key2").unwrap(), 123);
        assert_eq!(provider.get_duration("key3").unwrap(), Duration::from_millis(250));
        assert!(provider.get_string("missing").is_err());
        assert!(provider.get_duration("key1").is_err());
    }

    #[test]
    fn test_env_config_provider_key_format() {
        let provider = EnvConfigProvider::new()
            .with_prefix("ACTIVITY")
            .with_namespace("cache");

        assert_eq!(provider.format_key("ttl"), "ACTIVITY_CACHE_TTL");
        assert_eq!(provider.format_key("max-entries"), "ACTIVITY_CACHE_MAX_ENTRIES");
        assert_eq!(EnvConfigProvider::new().format_key("model"), "MODEL");
    }

    #[test]
    fn test_composite_config_provider() {
        let first: MemoryConfigProvider = [("key1", "value1")].into_iter().collect();
        let second: MemoryConfigProvider =
            [("key1", "shadowed"), ("key2", "value2")].into_iter().collect();

        let provider = CompositeConfigProvider::new()
            .with_provider(first)
            .with_provider(second);

        assert_eq!(provider.get_string("key1").unwrap(), "value1");
        assert_eq!(provider.get_string("key2").unwrap(), "value2");
        assert!(provider.get_string("key3").is_err());
    }

    #[test]
    fn test_openai_config() {
        let provider: MemoryConfigProvider = [
            ("openai_api_key", "test_api_key"),
            ("openai_base_url", "https://test.openai.com/v1"),
        ]
        .into_iter()
        .collect();

        let config = OpenAIConfig::from_provider(&provider).unwrap();
        assert_eq!(config.api_key, "test_api_key");
        assert_eq!(config.base_url, "https://test.openai.com/v1");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.model, "gpt-4o-mini");

        let config = OpenAIConfig {
            api_key: "".to_string(),
            ..OpenAIConfig::default()
        };
        assert!(config.validate().is_err());

        let config = OpenAIConfig {
            api_key: "key".to_string(),
            base_url: "not a url".to_string(),
            ..OpenAIConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
