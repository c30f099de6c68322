//! Biomedical findings summaries for a single variant.
//!
//! Single request/response with no pipeline ordering. Uses the backend
//! handle built at startup if there is one, otherwise the local summarizer.

use std::sync::Arc;
use thiserror::Error;

use polyrisk_core::{ExtractiveSummarizer, LengthBounds, LocalSummarizer};

use crate::backend::{BackendConnector, BackendHandle};
use crate::probe::BackendProbe;
use crate::prompts::build_biomed_prompt;

/// Message returned for a request without text.
pub const EMPTY_INPUT_MESSAGE: &str = "No input text provided.";

#[derive(Error, Debug)]
pub enum BiomedError {
    #[error("No input text provided.")]
    EmptyInput,

    #[error("{0}")]
    Summarizer(String),
}

impl BiomedError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }
}

/// Summarizes literature text about one variant.
pub struct BiomedSummaryService {
    backend: Option<BackendHandle>,
    local: Arc<dyn LocalSummarizer>,
    bounds: LengthBounds,
}

impl BiomedSummaryService {
    pub fn new(
        backend: Option<BackendHandle>,
        local: Arc<dyn LocalSummarizer>,
        bounds: LengthBounds,
    ) -> Self {
        Self {
            backend,
            local,
            bounds,
        }
    }

    /// Local summaries only.
    pub fn local(bounds: LengthBounds) -> Self {
        Self::new(None, Arc::new(ExtractiveSummarizer::new()), bounds)
    }

    /// Probe once and keep a backend handle if one can be built.
    pub async fn connect(
        probe: &dyn BackendProbe,
        connector: &BackendConnector,
        bounds: LengthBounds,
    ) -> Self {
        let backend = if probe.is_available().await {
            match connector.connect() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "Biomedical backend handle construction failed");
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(
            backend = backend.as_ref().map(BackendHandle::model),
            "Biomedical summary service ready"
        );

        Self::new(backend, Arc::new(ExtractiveSummarizer::new()), bounds)
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn summarize(&self, identifier: &str, text: &str) -> Result<String, BiomedError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BiomedError::EmptyInput);
        }

        let summary = match &self.backend {
            Some(backend) => backend
                .generate(&build_biomed_prompt(identifier, text))
                .await
                .map_err(|e| BiomedError::Summarizer(e.to_string()))?,
            None => self.local.summarize(text, self.bounds),
        };

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(BiomedError::Summarizer("summarizer produced no text".to_string()));
        }

        tracing::debug!(identifier, words = summary.split_whitespace().count(), "Biomedical summary produced");
        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::StaticProbe;
    use crate::test_support::{broken_connector, scripted_connector, ScriptedProvider};

    const ABSTRACT: &str = "The rs7903146 T allele in TCF7L2 is strongly associated with type 2 diabetes. \
        Carriers show impaired insulin secretion. \
        The odds ratio per risk allele is about 1.4 in European cohorts. \
        TCF7L2 regulates proglucagon expression in the gut.";

    fn bounds() -> LengthBounds {
        LengthBounds::new(50, 256)
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let service = BiomedSummaryService::local(bounds());
        let err = service.summarize("rs7903146", "   ").await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), EMPTY_INPUT_MESSAGE);
    }

    #[tokio::test]
    async fn test_local_summary() {
        let service = BiomedSummaryService::local(bounds());
        let summary = service.summarize("rs7903146", ABSTRACT).await.unwrap();
        assert!(summary.contains("TCF7L2"));
    }

    #[tokio::test]
    async fn test_backend_summary() {
        let provider = ScriptedProvider::always("TCF7L2 variant linked to type 2 diabetes.");
        let service = BiomedSummaryService::connect(
            &StaticProbe::available(),
            &scripted_connector(provider.clone()),
            bounds(),
        )
        .await;

        assert!(service.has_backend());
        let summary = service.summarize("rs7903146", ABSTRACT).await.unwrap();
        assert_eq!(summary, "TCF7L2 variant linked to type 2 diabetes.");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_is_server_error() {
        let service = BiomedSummaryService::connect(
            &StaticProbe::available(),
            &scripted_connector(ScriptedProvider::failing()),
            bounds(),
        )
        .await;

        let err = service.summarize("rs7903146", ABSTRACT).await.unwrap_err();
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_unavailable_or_broken_backend_runs_locally() {
        let provider = ScriptedProvider::always("unused");
        let down = BiomedSummaryService::connect(
            &StaticProbe::unavailable(),
            &scripted_connector(provider.clone()),
            bounds(),
        )
        .await;
        let broken =
            BiomedSummaryService::connect(&StaticProbe::available(), &broken_connector(), bounds())
                .await;

        assert!(!down.has_backend());
        assert!(!broken.has_backend());
        assert!(!down.summarize("rs7903146", ABSTRACT).await.unwrap().is_empty());
        assert_eq!(provider.calls(), 0);
    }
}
