//! Agent output shape checking and repair.
//!
//! Models wrap JSON in code fences or surround it with prose. Candidates
//! are tried in order: the whole text, each fenced block, then the widest
//! `{ ... }` span. The first candidate that is exactly `{scores, summary}`
//! wins.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use polyrisk_core::{RunResult, Score, ScoreSet, Summary};

use crate::error::PipelineError;

lazy_static! {
    static ref FENCED: Regex = Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").expect("valid regex");
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AgentAnswer {
    scores: Vec<Score>,
    summary: String,
}

fn candidates(text: &str) -> Vec<&str> {
    let mut found = vec![text.trim()];

    found.extend(
        FENCED
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim()),
    );

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            found.push(&text[start..=end]);
        }
    }

    found
}

/// First JSON object embedded in `text`, if any.
pub(crate) fn extract_json_object(text: &str) -> Option<JsonValue> {
    candidates(text)
        .into_iter()
        .filter_map(|c| serde_json::from_str::<JsonValue>(c).ok())
        .find(JsonValue::is_object)
}

/// Parse an agent's final answer into a [`RunResult`].
pub fn parse_agent_output(raw: &str) -> Result<RunResult, PipelineError> {
    candidates(raw)
        .into_iter()
        .find_map(|c| serde_json::from_str::<AgentAnswer>(c).ok())
        .map(|answer| RunResult {
            scores: ScoreSet::new(answer.scores),
            summary: Summary::new(answer.summary),
        })
        .ok_or_else(|| {
            PipelineError::AgentOutputMalformed(
                "expected a JSON object with exactly the keys scores and summary".to_string(),
            )
        })
}

/// Parse an agent's final answer, degrading to `{summary: raw, scores: []}`.
pub fn normalize_agent_output(raw: &str) -> RunResult {
    parse_agent_output(raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Agent output malformed, returning raw text as summary");
        RunResult {
            scores: ScoreSet::default(),
            summary: Summary::new(raw),
        }
    })
}
