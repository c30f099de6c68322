//! Run-level error taxonomy.
//!
//! Backend availability problems never appear here: they are absorbed by
//! strategy selection or the summarization fallback chain.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use polyrisk_core::StageError;

use crate::agents::AgentError;

/// Machine-checkable error kind reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputTooShort,
    NoVariants,
    Computation,
    AgentOutputMalformed,
    AgentStepLimitExceeded,
    Agent,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputTooShort => "input_too_short",
            Self::NoVariants => "no_variants",
            Self::Computation => "computation",
            Self::AgentOutputMalformed => "agent_output_malformed",
            Self::AgentStepLimitExceeded => "agent_step_limit_exceeded",
            Self::Agent => "agent",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run failed; no partial result exists.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Genome text seems too short: {length} characters, need at least {minimum}")]
    InputTooShort { length: usize, minimum: usize },

    #[error("Genome text contains no variant records")]
    NoVariants,

    #[error("Score computation failed: {0}")]
    Computation(String),

    #[error("Agent output could not be parsed: {0}")]
    AgentOutputMalformed(String),

    #[error("Agent reached its step limit of {max_steps} without a final answer")]
    AgentStepLimitExceeded { max_steps: usize },

    #[error("Agent run failed: {0}")]
    Agent(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputTooShort { .. } => ErrorKind::InputTooShort,
            Self::NoVariants => ErrorKind::NoVariants,
            Self::Computation(_) => ErrorKind::Computation,
            Self::AgentOutputMalformed(_) => ErrorKind::AgentOutputMalformed,
            Self::AgentStepLimitExceeded { .. } => ErrorKind::AgentStepLimitExceeded,
            Self::Agent(_) => ErrorKind::Agent,
        }
    }

    /// Whether the caller's input caused the failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::InputTooShort | ErrorKind::NoVariants)
    }
}

impl From<StageError> for PipelineError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::InputTooShort { length, minimum } => Self::InputTooShort { length, minimum },
            StageError::NoVariants => Self::NoVariants,
            StageError::EmptyTargetSet => Self::Computation(err.to_string()),
        }
    }
}

impl From<AgentError> for PipelineError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::StepLimitExceeded(max_steps) => Self::AgentStepLimitExceeded { max_steps },
            AgentError::Tool { source, .. } => Self::from(source),
            other => Self::Agent(other.to_string()),
        }
    }
}
