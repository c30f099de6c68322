//! Reasoning loop trait and agent errors.

use async_trait::async_trait;
use polyrisk_core::StageError;
use thiserror::Error;

use super::StageLedger;
use crate::providers::ProviderError;
use crate::tools::ToolName;

/// Errors from an agent run. All of them fail the run.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM call failed: {0}")]
    LlmError(#[from] ProviderError),

    #[error("Step limit of {0} reached without a final answer")]
    StepLimitExceeded(usize),

    #[error("Tool {tool} failed: {source}")]
    Tool { tool: ToolName, source: StageError },

    #[error("Tool {requested} called out of order, expected {expected}")]
    StageOrder { requested: ToolName, expected: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// A bounded reasoning loop that drives the pipeline tools.
///
/// # Contract
/// - At most `max_steps` model turns; exceeding them is
///   [`AgentError::StepLimitExceeded`]
/// - Tools are only reachable through `ledger`, which enforces order and
///   threads stage outputs
/// - The returned text is the model's final answer, unvalidated; shape
///   checking happens in the caller
#[async_trait]
pub trait ReasoningLoop: Send + Sync {
    async fn run(
        &self,
        prompt: &str,
        ledger: &mut StageLedger<'_>,
        max_steps: usize,
    ) -> Result<String, AgentError>;

    /// Name for logs.
    fn name(&self) -> &str;
}
