//! Backend handles and the connector that builds them.
//!
//! A [`BackendHandle`] is a configured provider plus the model it runs.
//! Handles are cheap to build and each owner builds its own; the
//! summarization chain builds a fresh one per attempt so a backend that
//! went away between runs is noticed.

use std::sync::Arc;

use crate::config::BackendConfig;
use crate::providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderRegistry,
};

/// A configured inference backend.
#[derive(Clone)]
pub struct BackendHandle {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
}

impl BackendHandle {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
        }
    }

    /// Model identifier this handle generates with.
    pub fn model(&self) -> &str {
        &self.completion.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run a multi-turn completion, bounded by the generation timeout.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<CompletionResponse, ProviderError> {
        let timeout = self.completion.timeout;
        let response =
            match tokio::time::timeout(timeout, self.provider.complete(messages, &self.completion))
                .await
            {
                Ok(result) => result?,
                Err(_) => return Err(ProviderError::Timeout(timeout)),
            };

        tracing::debug!(
            provider = self.provider.name(),
            model = %response.model,
            tokens = response.usage.total(),
            "Backend completion finished"
        );

        Ok(response)
    }

    /// Generate text for a single prompt. Blank output is an error.
    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let response = self.chat(vec![ChatMessage::user(prompt)]).await?;
        let text = response.content.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("provider", &self.provider.name())
            .field("model", &self.completion.model)
            .finish()
    }
}

/// Builds backend handles from configuration.
#[derive(Debug, Clone)]
pub struct BackendConnector {
    registry: Arc<ProviderRegistry>,
    provider_type: String,
    provider_config: serde_json::Value,
    completion: CompletionConfig,
}

impl BackendConnector {
    pub fn new(registry: Arc<ProviderRegistry>, config: &BackendConfig) -> Self {
        Self {
            registry,
            provider_type: config.provider.clone(),
            provider_config: config.provider_config(),
            completion: config.completion_config(),
        }
    }

    pub fn model(&self) -> &str {
        &self.completion.model
    }

    /// Construct a new handle. Fails when the provider cannot be built.
    pub fn connect(&self) -> Result<BackendHandle, ProviderError> {
        let provider = self
            .registry
            .create(&self.provider_type, &self.provider_config)?;

        Ok(BackendHandle::new(provider, self.completion.clone()))
    }
}
