//! The four pipeline stages as independently callable tools.
//!
//! Both executors go through a [`ToolSet`]: the deterministic executor
//! calls it directly, the agent executor through a per-run ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use polyrisk_core::{
    compute_scores, validate, DomainConfig, ScoreSet, StageError, Summary, TargetSet, VariantSet,
};

use crate::resilience::SummarizationFallbackChain;

/// Pipeline tool names, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    Validate,
    SelectTargets,
    ComputeScores,
    Summarize,
}

impl ToolName {
    /// All tools in pipeline order.
    pub const ORDER: [ToolName; 4] = [
        ToolName::Validate,
        ToolName::SelectTargets,
        ToolName::ComputeScores,
        ToolName::Summarize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::SelectTargets => "select_targets",
            Self::ComputeScores => "compute_scores",
            Self::Summarize => "summarize",
        }
    }

    /// The stage after this one, if any.
    pub fn next(&self) -> Option<ToolName> {
        match self {
            Self::Validate => Some(Self::SelectTargets),
            Self::SelectTargets => Some(Self::ComputeScores),
            Self::ComputeScores => Some(Self::Summarize),
            Self::Summarize => None,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ORDER
            .into_iter()
            .find(|tool| tool.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

/// Stage operations over one domain configuration.
pub struct ToolSet {
    domain: Arc<DomainConfig>,
    summarizer: Arc<SummarizationFallbackChain>,
}

impl ToolSet {
    pub fn new(domain: Arc<DomainConfig>, summarizer: Arc<SummarizationFallbackChain>) -> Self {
        Self { domain, summarizer }
    }

    pub fn domain(&self) -> &DomainConfig {
        &self.domain
    }

    /// Reject implausible input and parse variants. Never returns an empty set.
    pub fn validate(&self, raw_input: &str) -> Result<VariantSet, StageError> {
        validate(raw_input)
    }

    /// Targets for this domain. Total.
    pub fn select_targets(&self, variants: &VariantSet) -> TargetSet {
        self.domain.select_targets(variants)
    }

    /// Scores for the requested targets. Fails only on an empty target set.
    pub fn compute_scores(
        &self,
        targets: &TargetSet,
        variants: &VariantSet,
    ) -> Result<ScoreSet, StageError> {
        compute_scores(targets, variants, &self.domain.catalog)
    }

    /// Summarize through the fallback chain. Never fails, never empty.
    pub async fn summarize(&self, scores: &ScoreSet) -> Summary {
        self.summarizer.summarize(scores).await.summary
    }
}
