//! Stage-level failures.

use thiserror::Error;

/// Errors raised by the deterministic stages.
///
/// Validation and score computation fail fast; target selection and
/// summarization have no failure mode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("Genome text seems too short: {length} characters, need at least {minimum}")]
    InputTooShort { length: usize, minimum: usize },

    #[error("Genome text contains no variant records")]
    NoVariants,

    #[error("Cannot compute scores for an empty target set")]
    EmptyTargetSet,
}
