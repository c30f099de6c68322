//! 23andMe raw-data parsing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::StageError;
use crate::types::{Variant, VariantSet};

/// Inputs shorter than this many characters are rejected before parsing.
pub const MIN_INPUT_LENGTH: usize = 100;

lazy_static! {
    static ref CHR_PREFIX: Regex = Regex::new(r"(?i)^chr").expect("valid regex");
}

/// Validation stage: reject implausible input, then parse it.
///
/// Fails with [`StageError::InputTooShort`] below [`MIN_INPUT_LENGTH`]
/// characters, and with [`StageError::NoVariants`] when the text holds only
/// comments or blank lines. On success the set is never empty.
pub fn validate(raw: &str) -> Result<VariantSet, StageError> {
    let length = raw.chars().count();
    if length < MIN_INPUT_LENGTH {
        return Err(StageError::InputTooShort {
            length,
            minimum: MIN_INPUT_LENGTH,
        });
    }

    let variants = parse_23andme(raw);
    if variants.is_empty() {
        return Err(StageError::NoVariants);
    }

    tracing::debug!(count = variants.len(), "Parsed genome text");
    Ok(variants)
}

/// Parse tab-delimited `rsid chromosome position genotype` records.
///
/// Parsing is lenient: `#` comments and blank lines are skipped, fields
/// fall back to whitespace splitting, missing identifiers become
/// `var_<index>` and missing genotypes become `--`.
pub fn parse_23andme(text: &str) -> VariantSet {
    let variants = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .enumerate()
        .map(|(index, line)| parse_line(index, line))
        .collect();

    VariantSet::new(variants)
}

fn parse_line(index: usize, line: &str) -> Variant {
    let fields: Vec<&str> = if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };

    let field = |i: usize| fields.get(i).copied().filter(|f| !f.is_empty());

    let rsid = field(0)
        .map(str::to_string)
        .unwrap_or_else(|| format!("var_{}", index));
    let chromosome = field(1)
        .map(|c| CHR_PREFIX.replace(c, "").into_owned())
        .unwrap_or_default();
    let position = field(2).and_then(|p| p.parse::<u64>().ok());
    let genotype = field(3)
        .map(str::to_uppercase)
        .unwrap_or_else(|| "--".to_string());

    Variant {
        rsid,
        chromosome,
        position,
        genotype,
    }
}
