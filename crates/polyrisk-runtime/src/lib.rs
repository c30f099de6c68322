//! # polyrisk-runtime
//!
//! Runs the polyrisk pipeline with or without an inference backend.
//!
//! At startup a [`StrategySelector`] probes the backend once and picks an
//! executor for the whole session:
//! - **Agent**: a chat model calls the four stages as tools, in order
//! - **Deterministic**: the stages are called directly
//!
//! Either way, the summarization stage goes through a fallback chain
//! (cache, preferred backend, local summarizer, sentinel) and never fails.
//!
//! ## Example
//!
//! ```rust,ignore
//! use polyrisk_runtime::{RunController, RunRequest, RuntimeConfig};
//!
//! let controller = RunController::builder()
//!     .config(RuntimeConfig::from_env())
//!     .build()
//!     .await;
//!
//! let result = controller.handle(&RunRequest::new(genome_text)).await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

pub mod agents;
pub mod backend;
pub mod biomed;
pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod probe;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use backend::{BackendConnector, BackendHandle};
pub use biomed::{BiomedError, BiomedSummaryService, EMPTY_INPUT_MESSAGE};
pub use cache::{CacheKey, SummaryCache};
pub use config::{AgentConfig, BackendConfig, CacheConfig, RuntimeConfig, DEFAULT_GOAL};
pub use error::{ErrorKind, PipelineError};
pub use executor::{
    AgentExecutor, DeterministicExecutor, Executor, ExecutorOutput, RunRequest, Strategy,
};
pub use orchestrator::{RunController, RunControllerBuilder, SessionContext, StrategySelector};
pub use probe::{BackendProbe, HttpHealthProbe, StaticProbe};
pub use providers::{LlmProvider, ProviderError, ProviderRegistry};
pub use resilience::{SummarizationFallbackChain, SummaryOutcome, SummaryTier};
pub use tools::{ToolName, ToolSet};
