//! Prompts sent to the inference backend.
//!
//! The agent system prompt is fixed; run, summary and biomedical prompts
//! are built per call.

/// Longest genome excerpt embedded in an agent prompt, in characters.
pub const MAX_PROMPT_INPUT_CHARS: usize = 200_000;

/// System prompt for the tool-calling agent.
pub const AGENT_SYSTEM_PROMPT: &str = r#"
You are a pipeline agent for polygenic risk analysis.

You have exactly four tools. Call them one at a time, in this order:
1. validate        - checks the genome text and parses its variants
2. select_targets  - picks the traits to score
3. compute_scores  - computes a percentile score per trait
4. summarize       - writes a plain-language summary of the scores

The runtime passes each tool's output to the next tool. You never need to
copy data between tools.

## Protocol
To call a tool, reply with only this JSON:
{"tool": "<tool name>"}

You will receive the tool's result as an observation.

After summarize, reply with only this JSON:
{"final_answer": {"scores": <compute_scores result>, "summary": "<summarize result>"}}

Do not skip tools. Do not call a tool twice. Do not add keys.
"#;

/// Instruction placed before the serialized scores.
pub const SUMMARY_INSTRUCTION: &str =
    "Summarize the following PRS results for a medical professional:";

/// Build the per-run agent prompt.
pub fn build_run_prompt(goal: &str, raw_input: &str) -> String {
    let excerpt = truncate_chars(raw_input, MAX_PROMPT_INPUT_CHARS);
    format!(
        "Goal: {goal}\n\n\
         Run the tools in order: validate, select_targets, compute_scores, summarize.\n\
         Return a single JSON object with exactly the keys \"scores\" and \"summary\".\n\n\
         genomeText:\n{excerpt}"
    )
}

/// Build the backend summary prompt for a serialized score payload.
pub fn build_summary_prompt(payload: &str) -> String {
    format!("{SUMMARY_INSTRUCTION}\n\n{payload}")
}

/// Build the biomedical findings prompt for one variant.
pub fn build_biomed_prompt(identifier: &str, text: &str) -> String {
    format!(
        "Summarize biomedical findings related to SNP {identifier}. Focus on:\n\
         - Disease associations\n\
         - Functional effects\n\
         - Risk alleles or odds ratios\n\
         - Affected genes or mechanisms\n\
         Limit to 150 words.\n\n\
         {text}"
    )
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
