//! Resilience patterns for polyrisk-runtime.
//!
//! Backend failures never reach callers. This module holds the ordered
//! fallback used for the summarization stage.

mod fallback;

pub use fallback::{
    FallbackChain, SummarizationFallbackChain, SummaryAttemptError, SummaryOutcome, SummaryTier,
};
