//! Value objects that flow between the four pipeline stages.
//!
//! Everything here is transient and request-scoped. A `VariantSet` is only
//! produced by validation, a `ScoreSet` only by score computation, and a
//! `Summary` can never be empty.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel returned when no summarizer produced usable text.
pub const SUMMARY_UNAVAILABLE: &str = "No summary available.";

/// A single genotyped marker from a raw genome file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Marker identifier (e.g., "rs429358")
    pub rsid: String,

    /// Chromosome without any `chr` prefix
    #[serde(rename = "chrom")]
    pub chromosome: String,

    /// 1-based position, when the file provides a numeric one
    #[serde(rename = "pos")]
    pub position: Option<u64>,

    /// Upper-cased genotype call (e.g., "AG"), `--` when uncalled
    pub genotype: String,
}

impl Variant {
    /// Number of copies of `allele` in this genotype (0, 1 or 2).
    pub fn dosage(&self, allele: &str) -> u8 {
        let Some(allele) = allele.chars().next().map(|c| c.to_ascii_uppercase()) else {
            return 0;
        };
        self.genotype.chars().filter(|c| *c == allele).take(2).count() as u8
    }
}

/// Ordered variants produced by the validation stage.
///
/// Immutable once built; downstream stages only borrow it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantSet {
    variants: Vec<Variant>,
}

impl VariantSet {
    pub fn new(variants: Vec<Variant>) -> Self {
        Self { variants }
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter()
    }

    /// Look up a variant by marker identifier.
    pub fn get(&self, rsid: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.rsid == rsid)
    }
}

/// Opaque domain code for a trait or condition (e.g., an EFO identifier).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Targets selected for scoring. Duplicates are dropped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetSet {
    targets: Vec<TargetId>,
}

impl TargetSet {
    pub fn new(targets: impl IntoIterator<Item = TargetId>) -> Self {
        let mut unique: Vec<TargetId> = Vec::new();
        for target in targets {
            if !unique.contains(&target) {
                unique.push(target);
            }
        }
        Self { targets: unique }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn contains(&self, target: &TargetId) -> bool {
        self.targets.contains(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetId> {
        self.targets.iter()
    }
}

/// One computed polygenic score.
///
/// Field names on the wire follow the established `{efoId, trait, id, name,
/// percentile}` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Target this score was computed for
    #[serde(rename = "efoId")]
    pub target: TargetId,

    /// Human-readable trait label
    #[serde(rename = "trait")]
    pub trait_label: String,

    /// Identifier of the scoring model (e.g., "PGS000127")
    #[serde(rename = "id")]
    pub source_id: String,

    /// Population percentile, 0.0 - 100.0
    pub percentile: f64,

    /// Optional display name of the scoring model
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Scores in computation order.
///
/// Ordering is not guaranteed to follow the requested target order; look
/// scores up by target instead of by position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSet {
    scores: Vec<Score>,
}

impl ScoreSet {
    pub fn new(scores: Vec<Score>) -> Self {
        Self { scores }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Score> {
        self.scores.iter()
    }

    /// All scores computed for a target.
    pub fn for_target<'a>(&'a self, target: &'a TargetId) -> impl Iterator<Item = &'a Score> {
        self.scores.iter().filter(move |s| &s.target == target)
    }

    pub fn into_vec(self) -> Vec<Score> {
        self.scores
    }
}

/// Natural-language summary of a score set. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Summary(String);

impl Summary {
    /// Wrap `text`, substituting [`SUMMARY_UNAVAILABLE`] when it is blank.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self(SUMMARY_UNAVAILABLE.to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    /// The sentinel summary.
    pub fn unavailable() -> Self {
        Self(SUMMARY_UNAVAILABLE.to_string())
    }

    pub fn is_unavailable(&self) -> bool {
        self.0 == SUMMARY_UNAVAILABLE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Summary {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Summary> for String {
    fn from(value: Summary) -> Self {
        value.0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The only object that crosses the system boundary back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub scores: ScoreSet,
    pub summary: Summary,
}
