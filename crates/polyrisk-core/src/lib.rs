//! # polyrisk-core
//!
//! Deterministic stages of the polyrisk analysis pipeline.
//!
//! This crate answers, without any network access:
//! - Is this genome text structurally plausible, and what variants does it hold?
//! - Which targets does the configured domain score?
//! - Where does this genome fall on each target's score distribution?
//! - What does a plain, local summary of those scores say?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No LLM calls**: Summaries here are extractive
//! 3. **Fail-fast**: Validation and scoring errors abort the run
//! 4. **Never empty**: A [`Summary`] always carries text
//!
//! ## Example
//!
//! ```rust,ignore
//! use polyrisk_core::{analyze_locally, DomainConfig, ExtractiveSummarizer, LengthBounds};
//!
//! let genome = std::fs::read_to_string("genome.txt")?;
//! let domain = DomainConfig::cardiometabolic();
//! let result = analyze_locally(&genome, &domain, &ExtractiveSummarizer, LengthBounds::default())?;
//!
//! for score in result.scores.iter() {
//!     println!("{}: {:.1}", score.trait_label, score.percentile);
//! }
//! println!("{}", result.summary);
//! ```

pub mod domain;
pub mod error;
pub mod genome;
pub mod scoring;
pub mod summarizer;
pub mod types;

// Re-export main types at crate root
pub use domain::{DomainConfig, DomainError};
pub use error::StageError;
pub use genome::{parse_23andme, validate, MIN_INPUT_LENGTH};
pub use scoring::{compute_scores, normal_cdf, ScoreModel, SnpWeight};
pub use summarizer::{
    describe_scores, summarize_scores, ExtractiveSummarizer, LengthBounds, LocalSummarizer,
};
pub use types::{
    RunResult, Score, ScoreSet, Summary, TargetId, TargetSet, Variant, VariantSet,
    SUMMARY_UNAVAILABLE,
};

/// Run all four stages in-process, summarizing with a local summarizer.
///
/// This is the offline path: no backend is probed or called.
pub fn analyze_locally(
    raw: &str,
    domain: &DomainConfig,
    summarizer: &dyn LocalSummarizer,
    bounds: LengthBounds,
) -> Result<RunResult, StageError> {
    let variants = validate(raw)?;
    let targets = domain.select_targets(&variants);
    let scores = compute_scores(&targets, &variants, &domain.catalog)?;
    let summary = summarize_scores(summarizer, &scores, bounds);

    Ok(RunResult { scores, summary })
}
