//! Summarization fallback chain.
//!
//! Every tier returns an explicit result; the chain walks the tiers in
//! order and stops at the first success. When every tier fails the
//! unavailable sentinel is returned, so summarizing never fails outward.
//!
//! The preferred-backend tier succeeds only if the probe reports the
//! backend available, a handle can be built, and generation succeeds. Any
//! one of those failing moves on to the next tier. There is no retry.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use polyrisk_core::{describe_scores, LengthBounds, LocalSummarizer, ScoreSet, Summary};

use crate::backend::BackendConnector;
use crate::cache::{CacheKey, SummaryCache};
use crate::probe::BackendProbe;
use crate::prompts::build_summary_prompt;
use crate::providers::ProviderError;

/// One way of producing a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryTier {
    /// A previously generated backend summary for the same scores
    Cache,

    /// Generation on the inference backend
    PreferredBackend,

    /// In-process extractive summarization
    LocalFallback,

    /// The fixed "unavailable" text; always succeeds
    Sentinel,
}

/// Why a tier produced nothing.
#[derive(Error, Debug)]
pub enum SummaryAttemptError {
    #[error("No cached summary")]
    CacheMiss,

    #[error("No inference backend configured")]
    NotConfigured,

    #[error("Inference backend unavailable at {0}")]
    BackendUnavailable(String),

    #[error("Backend handle construction failed: {0}")]
    Connect(#[source] ProviderError),

    #[error("Generation failed: {0}")]
    Generation(#[source] ProviderError),

    #[error("Score payload could not be serialized")]
    Payload,

    #[error("Local summarizer produced no text")]
    Empty,
}

/// Ordered tiers to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    tiers: Vec<SummaryTier>,
}

impl FallbackChain {
    /// Cache -> PreferredBackend -> LocalFallback
    pub fn default_chain() -> Self {
        Self {
            tiers: vec![
                SummaryTier::Cache,
                SummaryTier::PreferredBackend,
                SummaryTier::LocalFallback,
            ],
        }
    }

    /// Get tiers in order.
    pub fn tiers(&self) -> &[SummaryTier] {
        &self.tiers
    }
}

/// A produced summary and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
    pub summary: Summary,
    pub tier: SummaryTier,
}

/// Summarizes score sets through the configured tiers.
pub struct SummarizationFallbackChain {
    chain: FallbackChain,
    probe: Arc<dyn BackendProbe>,
    connector: Option<BackendConnector>,
    local: Arc<dyn LocalSummarizer>,
    cache: Option<Arc<SummaryCache>>,
    bounds: LengthBounds,
}

impl SummarizationFallbackChain {
    /// A chain with no backend: only the local tier can succeed.
    pub fn new(
        probe: Arc<dyn BackendProbe>,
        local: Arc<dyn LocalSummarizer>,
        bounds: LengthBounds,
    ) -> Self {
        Self {
            chain: FallbackChain::default_chain(),
            probe,
            connector: None,
            local,
            cache: None,
            bounds,
        }
    }

    pub fn with_connector(mut self, connector: BackendConnector) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_cache(mut self, cache: Arc<SummaryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Summarize `scores`. Never fails and never returns empty text.
    pub async fn summarize(&self, scores: &ScoreSet) -> SummaryOutcome {
        let payload = match serde_json::to_string_pretty(scores) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(error = %e, "Score payload could not be serialized");
                None
            }
        };

        for &tier in self.chain.tiers() {
            match self.attempt(tier, scores, payload.as_deref()).await {
                Ok(summary) => {
                    tracing::info!(tier = ?tier, "Summary produced");
                    return SummaryOutcome { summary, tier };
                }
                Err(SummaryAttemptError::CacheMiss) => {
                    tracing::debug!("Summary cache miss");
                }
                Err(e) => {
                    tracing::warn!(tier = ?tier, error = %e, "Summary tier failed, falling back");
                }
            }
        }

        tracing::warn!("All summary tiers failed, using sentinel");
        SummaryOutcome {
            summary: Summary::unavailable(),
            tier: SummaryTier::Sentinel,
        }
    }

    async fn attempt(
        &self,
        tier: SummaryTier,
        scores: &ScoreSet,
        payload: Option<&str>,
    ) -> Result<Summary, SummaryAttemptError> {
        match tier {
            SummaryTier::Cache => self.from_cache(payload).await,
            SummaryTier::PreferredBackend => self.from_backend(payload).await,
            SummaryTier::LocalFallback => self.from_local(scores),
            SummaryTier::Sentinel => Ok(Summary::unavailable()),
        }
    }

    async fn from_cache(&self, payload: Option<&str>) -> Result<Summary, SummaryAttemptError> {
        let (Some(cache), Some(connector)) = (&self.cache, &self.connector) else {
            return Err(SummaryAttemptError::CacheMiss);
        };
        let payload = payload.ok_or(SummaryAttemptError::Payload)?;

        cache
            .get(&CacheKey::new(connector.model(), payload))
            .await
            .ok_or(SummaryAttemptError::CacheMiss)
    }

    /// Without a serialized payload the backend is never asked.
    async fn from_backend(&self, payload: Option<&str>) -> Result<Summary, SummaryAttemptError> {
        let connector = self
            .connector
            .as_ref()
            .ok_or(SummaryAttemptError::NotConfigured)?;
        let payload = payload.ok_or(SummaryAttemptError::Payload)?;

        if !self.probe.is_available().await {
            return Err(SummaryAttemptError::BackendUnavailable(
                self.probe.endpoint().to_string(),
            ));
        }

        let handle = connector.connect().map_err(SummaryAttemptError::Connect)?;

        let text = handle
            .generate(&build_summary_prompt(payload))
            .await
            .map_err(SummaryAttemptError::Generation)?;

        let summary = Summary::new(text);

        if let Some(cache) = &self.cache {
            cache
                .insert(CacheKey::new(connector.model(), payload), summary.clone())
                .await;
        }

        Ok(summary)
    }

    fn from_local(&self, scores: &ScoreSet) -> Result<Summary, SummaryAttemptError> {
        let text = self.local.summarize(&describe_scores(scores), self.bounds);
        if text.trim().is_empty() {
            return Err(SummaryAttemptError::Empty);
        }
        Ok(Summary::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::StaticProbe;
    use crate::test_support::{broken_connector, scripted_connector, ScriptedProvider};
    use polyrisk_core::{ExtractiveSummarizer, Score, TargetId};
    use proptest::prelude::*;

    struct SilentSummarizer;

    impl LocalSummarizer for SilentSummarizer {
        fn summarize(&self, _text: &str, _bounds: LengthBounds) -> String {
            String::new()
        }
    }

    fn scores() -> ScoreSet {
        ScoreSet::new(vec![Score {
            target: TargetId::new("EFO_0004541"),
            trait_label: "HbA1c measurement".to_string(),
            source_id: "PGS000127".to_string(),
            percentile: 91.2,
            display_name: Some("Inouye 2018".to_string()),
        }])
    }

    fn chain(available: bool) -> SummarizationFallbackChain {
        let probe: Arc<dyn BackendProbe> = if available {
            Arc::new(StaticProbe::available())
        } else {
            Arc::new(StaticProbe::unavailable())
        };
        SummarizationFallbackChain::new(probe, Arc::new(ExtractiveSummarizer), LengthBounds::default())
    }

    #[test]
    fn test_default_chain() {
        let chain = FallbackChain::default_chain();
        assert_eq!(
            chain.tiers(),
            &[
                SummaryTier::Cache,
                SummaryTier::PreferredBackend,
                SummaryTier::LocalFallback
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_payload_skips_backend_tiers() {
        let provider = ScriptedProvider::always("never sent");
        let chain = chain(true)
            .with_connector(scripted_connector(provider.clone()))
            .with_cache(Arc::new(SummaryCache::default()));

        let cached = chain.attempt(SummaryTier::Cache, &scores(), None).await;
        let generated = chain
            .attempt(SummaryTier::PreferredBackend, &scores(), None)
            .await;
        let local = chain
            .attempt(SummaryTier::LocalFallback, &scores(), None)
            .await
            .unwrap();

        assert!(matches!(cached, Err(SummaryAttemptError::Payload)));
        assert!(matches!(generated, Err(SummaryAttemptError::Payload)));
        assert!(!local.as_str().is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_backend_is_never_called() {
        let provider = ScriptedProvider::always("backend summary");
        let chain = chain(false).with_connector(scripted_connector(provider.clone()));

        let outcome = chain.summarize(&scores()).await;

        assert_eq!(outcome.tier, SummaryTier::LocalFallback);
        assert_eq!(provider.calls(), 0);
        assert!(!outcome.summary.is_unavailable());
    }

    #[tokio::test]
    async fn test_available_backend_is_preferred() {
        let provider = ScriptedProvider::always("HbA1c risk is elevated.");
        let chain = chain(true).with_connector(scripted_connector(provider.clone()));

        let outcome = chain.summarize(&scores()).await;

        assert_eq!(outcome.tier, SummaryTier::PreferredBackend);
        assert_eq!(outcome.summary.as_str(), "HbA1c risk is elevated.");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back_without_retry() {
        let provider = ScriptedProvider::failing();
        let chain = chain(true).with_connector(scripted_connector(provider.clone()));

        let outcome = chain.summarize(&scores()).await;

        assert_eq!(outcome.tier, SummaryTier::LocalFallback);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_falls_back() {
        let outcome = chain(true)
            .with_connector(broken_connector())
            .summarize(&scores())
            .await;
        assert_eq!(outcome.tier, SummaryTier::LocalFallback);
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_payloads() {
        let provider = ScriptedProvider::always("Cached once.");
        let chain = chain(true)
            .with_connector(scripted_connector(provider.clone()))
            .with_cache(Arc::new(SummaryCache::default()));

        let first = chain.summarize(&scores()).await;
        let second = chain.summarize(&scores()).await;

        assert_eq!(first.tier, SummaryTier::PreferredBackend);
        assert_eq!(second.tier, SummaryTier::Cache);
        assert_eq!(first.summary, second.summary);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_local_summaries_are_not_cached() {
        let provider = ScriptedProvider::failing();
        let cache = Arc::new(SummaryCache::default());
        let chain = chain(true)
            .with_connector(scripted_connector(provider.clone()))
            .with_cache(cache.clone());

        chain.summarize(&scores()).await;
        chain.summarize(&scores()).await;

        let payload = serde_json::to_string_pretty(&scores()).unwrap();
        assert_eq!(provider.calls(), 2);
        assert!(cache.get(&CacheKey::new("test-model", &payload)).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_local_output_becomes_sentinel() {
        let chain = SummarizationFallbackChain::new(
            Arc::new(StaticProbe::unavailable()),
            Arc::new(SilentSummarizer),
            LengthBounds::default(),
        );

        let outcome = chain.summarize(&scores()).await;

        assert_eq!(outcome.tier, SummaryTier::Sentinel);
        assert!(outcome.summary.is_unavailable());
    }

    proptest! {
        #[test]
        fn prop_unavailable_backend_never_generates(
            percentiles in proptest::collection::vec(0.0f64..100.0, 0..9)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let provider = ScriptedProvider::always("should not be used");
            let chain = chain(false).with_connector(scripted_connector(provider.clone()));
            let scores = ScoreSet::new(
                percentiles
                    .iter()
                    .enumerate()
                    .map(|(i, p)| Score {
                        target: TargetId::new(format!("EFO_{}", i)),
                        trait_label: "trait".to_string(),
                        source_id: format!("PGS{}", i),
                        percentile: *p,
                        display_name: None,
                    })
                    .collect(),
            );

            let outcome = runtime.block_on(chain.summarize(&scores));

            prop_assert_eq!(provider.calls(), 0);
            prop_assert!(!outcome.summary.as_str().is_empty());
        }
    }
}
