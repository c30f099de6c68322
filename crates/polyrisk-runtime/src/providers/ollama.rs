//! Ollama provider over its local HTTP API.
//!
//! Completions use `POST /api/chat` with streaming disabled; health uses
//! `GET /api/tags`, which answers as soon as the daemon is up.

use super::{
    factory::ProviderFactory, ChatMessage, CompletionConfig, CompletionResponse, LlmProvider,
    ProviderError, TokenUsage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Default address of a local Ollama daemon.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Environment variable naming the model to run.
pub const OLLAMA_MODEL_ENV: &str = "OLLAMA_MODEL";

/// Model used when none is configured.
pub const DEFAULT_OLLAMA_MODEL: &str = "mediphi-lite";

/// Ollama chat provider.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a provider for `model` served at `base_url`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }

    /// Create from JSON configuration (`base_url`, `model`).
    pub fn from_config(config: &JsonValue) -> Result<Self, ProviderError> {
        let base_url = config["base_url"].as_str().unwrap_or(DEFAULT_OLLAMA_URL);
        let model = config["model"].as_str().unwrap_or(DEFAULT_OLLAMA_MODEL);
        Self::new(base_url, model)
    }

    /// The model this provider runs by default.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Base URL of the daemon, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Health endpoint for a daemon at `base_url`.
    pub fn health_url(base_url: &str) -> String {
        format!("{}/api/tags", base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    message: ResponseMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let model = if config.model.is_empty() {
            self.model.as_str()
        } else {
            config.model.as_str()
        };

        let request = ChatRequest {
            model,
            messages: &messages,
            stream: false,
            options: ChatOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else if e.is_connect() {
                    ProviderError::BackendUnavailable(e.to_string())
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let message = match response.json::<OllamaError>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
            };
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(CompletionResponse {
            content: body.message.content,
            usage: TokenUsage {
                prompt_tokens: body.prompt_eval_count,
                completion_tokens: body.eval_count,
            },
            model: if body.model.is_empty() {
                model.to_string()
            } else {
                body.model
            },
            stop_reason: body.done_reason,
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Factory for Ollama providers.
///
/// ## Configuration Format
/// ```json
/// {
///   "base_url": "http://localhost:11434",
///   "model": "mediphi-lite"
/// }
/// ```
pub struct OllamaProviderFactory;

impl ProviderFactory for OllamaProviderFactory {
    fn provider_type(&self) -> &'static str {
        "ollama"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(OllamaProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        if let Some(url) = config["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ProviderError::NotConfigured(
                    "base_url must start with http:// or https://".to_string(),
                ));
            }
        }

        if let Some(model) = config.get("model") {
            match model.as_str() {
                Some(name) if !name.trim().is_empty() => {}
                _ => {
                    return Err(ProviderError::NotConfigured(
                        "model must be a non-empty string".to_string(),
                    ))
                }
            }
        }

        Ok(())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({
            "base_url": DEFAULT_OLLAMA_URL,
            "model": DEFAULT_OLLAMA_MODEL,
        })
    }

    fn description(&self) -> &'static str {
        "Ollama local inference daemon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "mediphi-lite").unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.base_url(), "http://localhost:11434");
        assert_eq!(provider.model(), "mediphi-lite");
    }

    #[test]
    fn test_health_url() {
        assert_eq!(
            OllamaProvider::health_url("http://host:1/"),
            "http://host:1/api/tags"
        );
    }

    #[test]
    fn test_factory_defaults() {
        let config = OllamaProviderFactory.default_config();
        assert_eq!(config["model"], DEFAULT_OLLAMA_MODEL);
        assert_eq!(config["base_url"], DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_factory_validate_invalid_base_url() {
        let config = serde_json::json!({"base_url": "localhost:11434"});
        assert!(OllamaProviderFactory.validate_config(&config).is_err());
    }

    #[test]
    fn test_factory_validate_blank_model() {
        let config = serde_json::json!({"model": "  "});
        assert!(OllamaProviderFactory.validate_config(&config).is_err());
    }

    #[test]
    fn test_chat_request_shape() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatRequest {
            model: "m",
            messages: &messages,
            stream: false,
            options: ChatOptions {
                temperature: 0.0,
                num_predict: 64,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["options"]["num_predict"], 64);
    }
}
