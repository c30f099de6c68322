//! Per-run stage ledger.
//!
//! The ledger is the agent's only access to the tools. It keeps each
//! stage's output and feeds it to the next stage itself, so the model only
//! chooses *which* tool to call and can never substitute data. Calls out
//! of the fixed order fail the run.

use serde_json::{json, Value as JsonValue};

use polyrisk_core::{ScoreSet, Summary, TargetSet, VariantSet};

use super::AgentError;
use crate::tools::{ToolName, ToolSet};

/// Stage outputs of a single agent run.
pub struct StageLedger<'a> {
    tools: &'a ToolSet,
    raw_input: &'a str,
    variants: Option<VariantSet>,
    targets: Option<TargetSet>,
    scores: Option<ScoreSet>,
    summary: Option<Summary>,
    completed: Vec<ToolName>,
}

impl<'a> StageLedger<'a> {
    pub fn new(tools: &'a ToolSet, raw_input: &'a str) -> Self {
        Self {
            tools,
            raw_input,
            variants: None,
            targets: None,
            scores: None,
            summary: None,
            completed: Vec::new(),
        }
    }

    /// The only tool that may be called next.
    pub fn expected(&self) -> Option<ToolName> {
        match self.completed.last() {
            None => Some(ToolName::Validate),
            Some(last) => last.next(),
        }
    }

    pub fn completed(&self) -> &[ToolName] {
        &self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }

    /// Run `tool` on the outputs of the previous stage.
    ///
    /// Returns the observation shown to the model.
    pub async fn call(&mut self, tool: ToolName) -> Result<JsonValue, AgentError> {
        let expected = self.expected();
        if expected != Some(tool) {
            return Err(AgentError::StageOrder {
                requested: tool,
                expected: expected
                    .map(|t| t.as_str())
                    .unwrap_or("nothing, the pipeline is complete")
                    .to_string(),
            });
        }

        tracing::debug!(tool = %tool, "Agent tool call");

        let observation = match tool {
            ToolName::Validate => {
                let variants = self
                    .tools
                    .validate(self.raw_input)
                    .map_err(|source| AgentError::Tool { tool, source })?;
                let observation = json!({ "variant_count": variants.len() });
                self.variants = Some(variants);
                observation
            }
            ToolName::SelectTargets => {
                let variants = produced(&self.variants, tool)?;
                let targets = self.tools.select_targets(variants);
                let observation = json!({ "targets": targets });
                self.targets = Some(targets);
                observation
            }
            ToolName::ComputeScores => {
                let variants = produced(&self.variants, tool)?;
                let targets = produced(&self.targets, tool)?;
                let scores = self
                    .tools
                    .compute_scores(targets, variants)
                    .map_err(|source| AgentError::Tool { tool, source })?;
                let observation = json!({ "scores": scores });
                self.scores = Some(scores);
                observation
            }
            ToolName::Summarize => {
                let scores = produced(&self.scores, tool)?;
                let summary = self.tools.summarize(scores).await;
                let observation = json!({ "summary": summary.as_str() });
                self.summary = Some(summary);
                observation
            }
        };

        self.completed.push(tool);
        Ok(observation)
    }
}

fn produced<T>(slot: &Option<T>, tool: ToolName) -> Result<&T, AgentError> {
    slot.as_ref().ok_or_else(|| AgentError::StageOrder {
        requested: tool,
        expected: "an earlier stage".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::StaticProbe;
    use crate::resilience::SummarizationFallbackChain;
    use crate::test_support::sample_genome;
    use polyrisk_core::{DomainConfig, ExtractiveSummarizer, LengthBounds, StageError};
    use std::sync::Arc;

    fn tools() -> ToolSet {
        let chain = SummarizationFallbackChain::new(
            Arc::new(StaticProbe::unavailable()),
            Arc::new(ExtractiveSummarizer),
            LengthBounds::default(),
        );
        ToolSet::new(Arc::new(DomainConfig::cardiometabolic()), Arc::new(chain))
    }

    #[tokio::test]
    async fn test_full_sequence_threads_outputs() {
        let tools = tools();
        let genome = sample_genome();
        let mut ledger = StageLedger::new(&tools, &genome);

        for tool in ToolName::ORDER {
            ledger.call(tool).await.unwrap();
        }

        assert!(ledger.is_complete());
        assert_eq!(ledger.completed(), &ToolName::ORDER);
        assert_eq!(ledger.expected(), None);
    }

    #[tokio::test]
    async fn test_observations_carry_stage_output() {
        let tools = tools();
        let genome = sample_genome();
        let mut ledger = StageLedger::new(&tools, &genome);

        let validated = ledger.call(ToolName::Validate).await.unwrap();
        assert_eq!(validated["variant_count"], 5);

        let targets = ledger.call(ToolName::SelectTargets).await.unwrap();
        assert_eq!(targets["targets"].as_array().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_skipping_a_stage_fails() {
        let tools = tools();
        let genome = sample_genome();
        let mut ledger = StageLedger::new(&tools, &genome);

        let err = ledger.call(ToolName::ComputeScores).await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::StageOrder { requested: ToolName::ComputeScores, .. }
        ));
        assert!(ledger.completed().is_empty());
    }

    #[tokio::test]
    async fn test_repeating_a_stage_fails() {
        let tools = tools();
        let genome = sample_genome();
        let mut ledger = StageLedger::new(&tools, &genome);

        ledger.call(ToolName::Validate).await.unwrap();
        assert!(ledger.call(ToolName::Validate).await.is_err());
    }

    #[tokio::test]
    async fn test_tool_failure_is_reported() {
        let tools = tools();
        let mut ledger = StageLedger::new(&tools, "too short");

        let err = ledger.call(ToolName::Validate).await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Tool {
                tool: ToolName::Validate,
                source: StageError::InputTooShort { .. }
            }
        ));
    }
}
