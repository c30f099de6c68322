//! The two ways of driving one run through the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use polyrisk_core::RunResult;

use crate::agents::{ReasoningLoop, StageLedger};
use crate::error::PipelineError;
use crate::prompts::build_run_prompt;
use crate::tools::{ToolName, ToolSet};

/// Execution strategy chosen for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// LLM-mediated tool calling
    Agent,

    /// Direct staged calls
    Deterministic,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent => f.write_str("agent"),
            Self::Deterministic => f.write_str("deterministic"),
        }
    }
}

/// One analysis request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRequest {
    pub raw_input: String,

    #[serde(default)]
    pub goal: Option<String>,
}

impl RunRequest {
    pub fn new(raw_input: impl Into<String>) -> Self {
        Self {
            raw_input: raw_input.into(),
            goal: None,
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }
}

/// What an executor hands back before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorOutput {
    /// Already in result shape
    Structured(RunResult),

    /// Unvalidated final text from an agent
    Raw(String),
}

/// Drives one run through the four stages.
#[async_trait]
pub trait Executor: Send + Sync {
    fn strategy(&self) -> Strategy;

    async fn run(&self, request: &RunRequest) -> Result<ExecutorOutput, PipelineError>;
}

/// Calls the stages directly, in order. Fails fast on stage errors.
pub struct DeterministicExecutor {
    tools: Arc<ToolSet>,
}

impl DeterministicExecutor {
    pub fn new(tools: Arc<ToolSet>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Executor for DeterministicExecutor {
    fn strategy(&self) -> Strategy {
        Strategy::Deterministic
    }

    async fn run(&self, request: &RunRequest) -> Result<ExecutorOutput, PipelineError> {
        let variants = self.tools.validate(&request.raw_input)?;
        tracing::debug!(variants = variants.len(), "Validated input");

        let targets = self.tools.select_targets(&variants);
        tracing::debug!(targets = targets.len(), "Selected targets");

        let scores = self.tools.compute_scores(&targets, &variants)?;
        tracing::debug!(scores = scores.len(), "Computed scores");

        let summary = self.tools.summarize(&scores).await;

        Ok(ExecutorOutput::Structured(RunResult { scores, summary }))
    }
}

/// Runs the stages through a bounded reasoning loop.
pub struct AgentExecutor {
    tools: Arc<ToolSet>,
    reasoning: Arc<dyn ReasoningLoop>,
    max_steps: usize,
    default_goal: String,
}

impl AgentExecutor {
    pub fn new(
        tools: Arc<ToolSet>,
        reasoning: Arc<dyn ReasoningLoop>,
        max_steps: usize,
        default_goal: impl Into<String>,
    ) -> Self {
        Self {
            tools,
            reasoning,
            max_steps,
            default_goal: default_goal.into(),
        }
    }
}

#[async_trait]
impl Executor for AgentExecutor {
    fn strategy(&self) -> Strategy {
        Strategy::Agent
    }

    async fn run(&self, request: &RunRequest) -> Result<ExecutorOutput, PipelineError> {
        // Implausible input never reaches the model.
        self.tools.validate(&request.raw_input)?;

        let goal = request
            .goal
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or(self.default_goal.as_str());
        let prompt = build_run_prompt(goal, &request.raw_input);

        let mut ledger = StageLedger::new(&self.tools, &request.raw_input);
        let output = self
            .reasoning
            .run(&prompt, &mut ledger, self.max_steps)
            .await?;

        if !ledger.is_complete() {
            tracing::warn!(
                reasoning = self.reasoning.name(),
                completed = ledger.completed().len(),
                "Agent finished before running every stage"
            );
            return Err(PipelineError::Agent(format!(
                "finished after {} of {} stages",
                ledger.completed().len(),
                ToolName::ORDER.len()
            )));
        }

        Ok(ExecutorOutput::Raw(output))
    }
}
