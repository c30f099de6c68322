//! Chat-based tool loop.
//!
//! The model answers each turn with either `{"tool": name}` or
//! `{"final_answer": ...}`. A reply that is neither is taken as the final
//! answer verbatim.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::output::extract_json_object;
use super::{AgentError, ReasoningLoop, StageLedger};
use crate::backend::BackendHandle;
use crate::prompts::AGENT_SYSTEM_PROMPT;
use crate::providers::ChatMessage;
use crate::tools::ToolName;

#[derive(Debug, PartialEq)]
enum AgentAction {
    Call(String),
    Finish(String),
}

fn parse_action(reply: &str) -> AgentAction {
    if let Some(JsonValue::Object(map)) = extract_json_object(reply) {
        if let Some(answer) = map.get("final_answer") {
            return AgentAction::Finish(match answer {
                JsonValue::String(text) => text.clone(),
                other => other.to_string(),
            });
        }

        if let Some(tool) = map
            .get("tool")
            .or_else(|| map.get("action"))
            .and_then(JsonValue::as_str)
        {
            return AgentAction::Call(tool.to_string());
        }
    }

    AgentAction::Finish(reply.to_string())
}

/// Reasoning loop over a chat backend.
#[derive(Debug, Clone)]
pub struct ChatToolLoop {
    backend: BackendHandle,
}

impl ChatToolLoop {
    pub fn new(backend: BackendHandle) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ReasoningLoop for ChatToolLoop {
    async fn run(
        &self,
        prompt: &str,
        ledger: &mut StageLedger<'_>,
        max_steps: usize,
    ) -> Result<String, AgentError> {
        let mut messages = vec![
            ChatMessage::system(AGENT_SYSTEM_PROMPT.trim()),
            ChatMessage::user(prompt),
        ];

        for step in 1..=max_steps {
            let reply = self.backend.chat(messages.clone()).await?.content;

            match parse_action(&reply) {
                AgentAction::Call(name) => {
                    let tool: ToolName = name.parse().map_err(AgentError::UnknownTool)?;
                    let observation = ledger.call(tool).await?;
                    tracing::debug!(step, tool = %tool, "Agent step completed");

                    messages.push(ChatMessage::assistant(reply));
                    messages.push(ChatMessage::user(format!(
                        "Observation from {}:\n{}",
                        tool, observation
                    )));
                }
                AgentAction::Finish(answer) => {
                    tracing::info!(
                        step,
                        stages = ledger.completed().len(),
                        "Agent returned a final answer"
                    );
                    return Ok(answer);
                }
            }
        }

        Err(AgentError::StepLimitExceeded(max_steps))
    }

    fn name(&self) -> &str {
        "chat-tool-loop"
    }
}
