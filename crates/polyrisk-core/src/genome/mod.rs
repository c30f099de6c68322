//! Genome input validation.
//!
//! Raw genome text is checked for structural plausibility and parsed into a
//! [`VariantSet`](crate::types::VariantSet) before any other stage runs.

mod parser;

pub use parser::{parse_23andme, validate, MIN_INPUT_LENGTH};
