//! Local extractive summarization.
//!
//! The local summarizer is the last tier of every summarization fallback:
//! it runs in-process, never samples, and always produces the same output
//! for the same input. It ranks sentences by content-word frequency and
//! keeps the best ones, in original order, within the requested bounds.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{ScoreSet, Summary};

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[A-Za-z0-9][A-Za-z0-9_'-]*").expect("valid regex");
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "its", "of", "on", "or", "that", "the", "this", "to", "was", "were", "with", "which",
];

/// Length bounds in word (token-equivalent) units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min_words: usize,
    pub max_words: usize,
}

impl LengthBounds {
    pub fn new(min_words: usize, max_words: usize) -> Self {
        Self {
            min_words: min_words.min(max_words),
            max_words: max_words.max(1),
        }
    }
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self::new(25, 100)
    }
}

/// A summarizer that runs locally and cannot fail.
///
/// Implementations must be deterministic. An empty return value is allowed;
/// callers substitute the unavailable sentinel.
pub trait LocalSummarizer: Send + Sync {
    fn summarize(&self, text: &str, bounds: LengthBounds) -> String;
}

/// Frequency-ranked sentence extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveSummarizer;

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self
    }
}

struct Sentence<'a> {
    position: usize,
    text: &'a str,
    words: usize,
    weight: f64,
}

impl LocalSummarizer for ExtractiveSummarizer {
    fn summarize(&self, text: &str, bounds: LengthBounds) -> String {
        let raw = split_sentences(text);

        if raw.is_empty() {
            return String::new();
        }

        let mut frequency: HashMap<String, usize> = HashMap::new();
        for sentence in &raw {
            for word in content_words(sentence) {
                *frequency.entry(word).or_insert(0) += 1;
            }
        }

        let mut sentences: Vec<Sentence<'_>> = raw
            .iter()
            .enumerate()
            .map(|(position, &text)| {
                let words = WORD.find_iter(text).count();
                let total: usize = content_words(text)
                    .map(|w| frequency.get(&w).copied().unwrap_or(0))
                    .sum();
                Sentence {
                    position,
                    text,
                    words,
                    weight: total as f64 / words.max(1) as f64,
                }
            })
            .collect();

        // Highest weight first; earlier sentences win ties.
        sentences.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });

        let mut chosen: Vec<(usize, String)> = Vec::new();
        let mut used = 0usize;
        for sentence in &sentences {
            if used >= bounds.max_words {
                break;
            }
            if used + sentence.words <= bounds.max_words {
                chosen.push((sentence.position, sentence.text.to_string()));
                used += sentence.words;
            } else if used < bounds.min_words || chosen.is_empty() {
                let room = bounds.max_words - used;
                chosen.push((sentence.position, truncate_words(sentence.text, room)));
                used += room;
            }
        }

        chosen.sort_by_key(|(position, _)| *position);
        chosen
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Split on sentence punctuation followed by whitespace, and on newlines.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '\n' => true,
            '.' | '!' | '?' => chars.peek().map_or(true, |(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            let end = i + c.len_utf8();
            sentences.push(text[start..end].trim());
            start = end;
        }
    }
    sentences.push(text[start..].trim());
    sentences.retain(|s| WORD.is_match(s));
    sentences
}

fn content_words(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
}

fn truncate_words(text: &str, limit: usize) -> String {
    let mut end = text.len();
    for (count, m) in WORD.find_iter(text).enumerate() {
        if count == limit {
            end = m.start();
            break;
        }
    }
    let kept = text[..end].trim_end();
    format!("{}...", kept.trim_end_matches(|c: char| c == ',' || c == ';'))
}

/// Render scores as plain sentences for local summarization.
pub fn describe_scores(scores: &ScoreSet) -> String {
    if scores.is_empty() {
        return "No polygenic scores were computed for this genome.".to_string();
    }

    let mut ranked: Vec<_> = scores.iter().collect();
    ranked.sort_by(|a, b| {
        b.percentile
            .partial_cmp(&a.percentile)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut lines = vec![format!(
        "Polygenic scores were computed for {} traits.",
        scores.len()
    )];
    for score in ranked {
        let source = match &score.display_name {
            Some(name) => format!("{} ({})", score.source_id, name),
            None => score.source_id.clone(),
        };
        lines.push(format!(
            "{} ({}) is at the {:.1}th percentile {} according to {}.",
            capitalize(&score.trait_label),
            score.target,
            score.percentile,
            band(score.percentile),
            source
        ));
    }
    lines.join(" ")
}

/// Summarize a score set locally. Never empty.
pub fn summarize_scores(
    summarizer: &dyn LocalSummarizer,
    scores: &ScoreSet,
    bounds: LengthBounds,
) -> Summary {
    Summary::new(summarizer.summarize(&describe_scores(scores), bounds))
}

fn band(percentile: f64) -> &'static str {
    match percentile {
        p if p >= 90.0 => "which is markedly elevated",
        p if p >= 75.0 => "which is above average",
        p if p > 25.0 => "which is within the typical range",
        p if p > 10.0 => "which is below average",
        _ => "which is markedly low",
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Score, TargetId};
    use proptest::prelude::*;

    fn score(target: &str, label: &str, percentile: f64) -> Score {
        Score {
            target: TargetId::new(target),
            trait_label: label.to_string(),
            source_id: format!("PGS_{}", target),
            percentile,
            display_name: None,
        }
    }

    #[test]
    fn test_respects_max_words() {
        let text = "Alpha beta gamma delta. ".repeat(50);
        let out = ExtractiveSummarizer::new().summarize(&text, LengthBounds::new(5, 12));
        let words = WORD.find_iter(&out).count();
        assert!(words <= 12, "got {} words: {}", words, out);
        assert!(words >= 5);
    }

    #[test]
    fn test_keeps_original_order() {
        let text = "Cholesterol results matter. Unrelated filler here. Cholesterol risk high.";
        let out = ExtractiveSummarizer::new().summarize(text, LengthBounds::new(1, 8));
        let first = out.find("Cholesterol results").unwrap();
        let second = out.find("Cholesterol risk").unwrap();
        assert!(first < second);
        assert!(!out.contains("Unrelated"));
    }

    #[test]
    fn test_long_single_sentence_is_truncated_to_min() {
        let text = (0..60).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let out = ExtractiveSummarizer::new().summarize(&text, LengthBounds::new(10, 20));
        assert!(out.ends_with("..."));
        assert_eq!(WORD.find_iter(&out).count(), 20);
    }

    #[test]
    fn test_decimals_do_not_split_sentences() {
        let parts = split_sentences("HbA1c is at the 91.2th percentile. Next one\nLast");
        assert_eq!(parts, vec!["HbA1c is at the 91.2th percentile.", "Next one", "Last"]);
    }

    #[test]
    fn test_no_words_gives_empty() {
        let out = ExtractiveSummarizer::new().summarize("... !!! ???", LengthBounds::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_describe_scores_ranks_by_percentile() {
        let scores = ScoreSet::new(vec![
            score("EFO_1", "triglyceride measurement", 40.0),
            score("EFO_2", "coronary artery disease", 95.0),
        ]);
        let text = describe_scores(&scores);
        assert!(text.find("Coronary").unwrap() < text.find("Triglyceride").unwrap());
        assert!(text.contains("markedly elevated"));
    }

    #[test]
    fn test_summarize_empty_scores_is_not_empty() {
        let summary = summarize_scores(
            &ExtractiveSummarizer::new(),
            &ScoreSet::default(),
            LengthBounds::default(),
        );
        assert!(!summary.as_str().is_empty());
        assert!(!summary.is_unavailable());
    }

    #[test]
    fn test_deterministic() {
        let scores = ScoreSet::new(vec![
            score("EFO_1", "HbA1c measurement", 91.2),
            score("EFO_2", "LDL cholesterol measurement", 12.0),
        ]);
        let a = summarize_scores(&ExtractiveSummarizer, &scores, LengthBounds::default());
        let b = summarize_scores(&ExtractiveSummarizer, &scores, LengthBounds::default());
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_summary_never_empty(
            percentiles in proptest::collection::vec(0.0f64..100.0, 0..12),
            min in 0usize..40,
            max in 1usize..120,
        ) {
            let scores = ScoreSet::new(
                percentiles
                    .iter()
                    .enumerate()
                    .map(|(i, p)| score(&format!("EFO_{}", i), "some trait", *p))
                    .collect(),
            );
            let summary = summarize_scores(&ExtractiveSummarizer, &scores, LengthBounds::new(min, max));
            prop_assert!(!summary.as_str().is_empty());
        }
    }
}
