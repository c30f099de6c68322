//! Agent-mediated pipeline execution.
//!
//! A reasoning loop chooses which tool to call; a per-run ledger enforces
//! the fixed stage order and threads outputs. The loop's final text is
//! checked and repaired by [`output`].

mod chat_loop;
pub mod output;
mod stage_tools;
mod traits;

pub use chat_loop::ChatToolLoop;
pub use output::{normalize_agent_output, parse_agent_output};
pub use stage_tools::StageLedger;
pub use traits::{AgentError, ReasoningLoop};
