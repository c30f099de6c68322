//! Shared test doubles.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::BackendConnector;
use crate::config::BackendConfig;
use crate::providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderFactory, ProviderRegistry, TokenUsage,
};

/// Provider that replays canned replies and counts calls.
///
/// `None` entries fail the call. After the script runs out the last entry
/// repeats.
pub struct ScriptedProvider {
    replies: Vec<Option<String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn sequence(replies: Vec<Option<&str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.into_iter().map(|r| r.map(str::to_string)).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(reply: &str) -> Arc<Self> {
        Self::sequence(vec![Some(reply)])
    }

    pub fn failing() -> Arc<Self> {
        Self::sequence(vec![None])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .get(n.min(self.replies.len().saturating_sub(1)))
            .cloned()
            .flatten();

        match reply {
            Some(content) => Ok(CompletionResponse {
                content,
                usage: TokenUsage::default(),
                model: config.model.clone(),
                stop_reason: Some("stop".to_string()),
            }),
            None => Err(ProviderError::ApiError {
                status: 500,
                message: "model crashed".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedFactory {
    provider: Arc<ScriptedProvider>,
}

impl ProviderFactory for ScriptedFactory {
    fn provider_type(&self) -> &'static str {
        "scripted"
    }

    fn create(&self, _config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(self.provider.clone())
    }

    fn validate_config(&self, _config: &JsonValue) -> Result<(), ProviderError> {
        Ok(())
    }
}

pub fn scripted_backend_config() -> BackendConfig {
    BackendConfig {
        provider: "scripted".to_string(),
        model: "test-model".to_string(),
        ..BackendConfig::default()
    }
}

pub fn scripted_registry(provider: Arc<ScriptedProvider>) -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(ScriptedFactory { provider }));
    Arc::new(registry)
}

/// Connector whose handles all share `provider`.
pub fn scripted_connector(provider: Arc<ScriptedProvider>) -> BackendConnector {
    BackendConnector::new(scripted_registry(provider), &scripted_backend_config())
}

/// Connector that can never build a handle.
pub fn broken_connector() -> BackendConnector {
    BackendConnector::new(Arc::new(ProviderRegistry::new()), &scripted_backend_config())
}

/// A small 23andMe export hitting markers in the built-in catalog.
pub fn sample_genome() -> String {
    let mut text = String::from("# This data file generated by 23andMe\n");
    text.push_str("# rsid\tchromosome\tposition\tgenotype\n");
    text.push_str("rs7903146\t10\t114758349\tCT\n");
    text.push_str("rs429358\t19\t45411941\tCC\n");
    text.push_str("rs1333049\t9\t22125503\tCG\n");
    text.push_str("rs17367504\t1\t11862778\tAG\n");
    text.push_str("rs964184\t11\t116648917\tGG\n");
    text
}
