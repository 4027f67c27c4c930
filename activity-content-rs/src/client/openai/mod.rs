//! OpenAI-compatible generation client
//!
//! This module provides a [`GenerationClient`] backed by the chat completions
//! endpoint of the OpenAI API or any service exposing the same contract.

mod models;
pub use models::*;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client};

use super::{GenerationClient, Prompt};
use crate::config::{ConfigProvider, ConfigSection, OpenAIConfig, DEFAULT_PROVIDER};
use crate::content::ModelParameters;
use crate::error::{map_http_error, ErrorContext, GenerationError, Result};
use crate::util::{sanitize_for_logging, truncate_string};

const USER_AGENT: &str = concat!("activity-content-rs/", env!("CARGO_PKG_VERSION"));

/// OpenAI chat completions client
pub struct OpenAIGenerationClient {
    /// HTTP client
    http_client: Client,

    /// Configuration
    config: OpenAIConfig,
}

impl OpenAIGenerationClient {
    /// Create a client from an explicit configuration
    pub fn new_with_config(config: OpenAIConfig) -> Result<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .build()
            .map_err(|e| {
                GenerationError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Create a client from `ACTIVITY_OPENAI_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new_with_config(OpenAIConfig::from_provider(&**DEFAULT_PROVIDER)?)
    }

    /// Create a new builder for the client
    pub fn builder() -> OpenAIGenerationClientBuilder {
        OpenAIGenerationClientBuilder::default()
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, prompt: &Prompt, params: &ModelParameters) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(prompt.system.clone()),
                ChatMessage::user(prompt.user.clone()),
            ],
            temperature: Some(params.temperature),
            max_tokens: Some(params.max_tokens),
            response_format: Some(ResponseFormat::json_object()),
        }
    }

    /// Send a chat completion request
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = self.endpoint();
        debug!("Sending request to generation service: POST {}", url);

        let mut builder = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(ref org) = self.config.org_id {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder.json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "Generation service returned {}: {}",
                status,
                truncate_string(&sanitize_for_logging(&body), 300)
            );
            return Err(map_http_error(status, &body).with_context(
                ErrorContext::for_service("openai").status_code(status.as_u16()),
            ));
        }

        let body = response.text().await?;
        serde_json::from_str::<ChatCompletionResponse>(&body).map_err(|e| {
            GenerationError::parsing(format!("Failed to parse completion response: {}", e))
                .with_context(ErrorContext::for_service("openai").status_code(status.as_u16()))
        })
    }
}

#[async_trait]
impl GenerationClient for OpenAIGenerationClient {
    async fn call(&self, prompt: &Prompt, params: &ModelParameters) -> Result<String> {
        let request = self.build_request(prompt, params);
        let response = self.chat_completion(&request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::parsing("No completion choices returned"))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(GenerationError::content_filter(
                "Completion stopped by the content filter",
            ));
        }

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(GenerationError::parsing("Empty completion response")),
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Builder for the OpenAI generation client
#[derive(Default)]
pub struct OpenAIGenerationClientBuilder {
    api_key: Option<String>,
    org_id: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_seconds: Option<u64>,
}

impl OpenAIGenerationClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the organization ID
    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the chat model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the HTTP timeout in seconds
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Build the client
    ///
    /// Values not set on the builder are read from the environment, then
    /// from defaults.
    pub fn build(self) -> Result<OpenAIGenerationClient> {
        self.build_with_provider(&**DEFAULT_PROVIDER)
    }

    fn build_with_provider<P: ConfigProvider + ?Sized>(
        self,
        provider: &P,
    ) -> Result<OpenAIGenerationClient> {
        let mut config = OpenAIConfig::overlay_provider(provider);

        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(org_id) = self.org_id {
            config.org_id = Some(org_id);
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        OpenAIGenerationClient::new_with_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigProvider;

    #[test]
    fn test_builder_keeps_provider_settings_without_provider_key() {
        let provider: MemoryConfigProvider = [
            ("openai_model", "gpt-from-env"),
            ("openai_base_url", "http://proxy.local:8080/v1"),
            ("openai_org_id", "org-env"),
            ("openai_timeout_seconds", "12"),
        ]
        .into_iter()
        .collect();

        let client = OpenAIGenerationClient::builder()
            .api_key("builder-key")
            .build_with_provider(&provider)
            .unwrap();

        let config = client.config();
        assert_eq!(config.api_key, "builder-key");
        assert_eq!(config.model, "gpt-from-env");
        assert_eq!(config.base_url, "http://proxy.local:8080/v1");
        assert_eq!(config.org_id.as_deref(), Some("org-env"));
        assert_eq!(config.timeout_seconds, 12);
    }

    #[test]
    fn test_builder_overrides_provider_settings() {
        let provider: MemoryConfigProvider = [
            ("openai_api_key", "env-key"),
            ("openai_model", "gpt-from-env"),
        ]
        .into_iter()
        .collect();

        let client = OpenAIGenerationClient::builder()
            .model("gpt-from-builder")
            .build_with_provider(&provider)
            .unwrap();

        assert_eq!(client.config().api_key, "env-key");
        assert_eq!(client.config().model, "gpt-from-builder");
    }

    #[test]
    fn test_builder_requires_api_key() {
        let result = OpenAIGenerationClient::builder()
            .api_key("")
            .base_url("http://localhost:1")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_request_shape() {
        let client = OpenAIGenerationClient::builder()
            .api_key("test-key")
            .base_url("http://localhost:1/v1/")
            .model("test-model")
            .build()
            .unwrap();

        assert_eq!(client.endpoint(), "http://localhost:1/v1/chat/completions");

        let prompt = Prompt::new("Return JSON only.", "Story text");
        let request = client.build_request(&prompt, &ModelParameters::for_attempt(2));
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Story text");
        assert_eq!(json["max_tokens"], 1600);
        assert_eq!(json["response_format"]["type"], "json_object");
    }
}
