//! Polygenic score computation.
//!
//! Each score model is a weighted sum over effect-allele dosages. The raw
//! sum is standardised against the model's reference distribution and
//! mapped to a population percentile through the normal CDF.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::StageError;
use crate::types::{Score, ScoreSet, TargetId, TargetSet, Variant, VariantSet};

/// Weight of a single marker in a score model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnpWeight {
    pub rsid: String,
    pub effect_allele: String,
    pub beta: f64,
}

/// A polygenic score model for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreModel {
    /// Model identifier (e.g., "PGS000127")
    pub id: String,

    /// Optional display name (e.g., publication label)
    #[serde(default)]
    pub name: Option<String>,

    /// Target this model scores
    pub target: TargetId,

    /// Human-readable trait label
    #[serde(rename = "trait")]
    pub trait_label: String,

    /// Mean of the raw score in the reference population
    #[serde(default)]
    pub reference_mean: f64,

    /// Standard deviation of the raw score in the reference population
    #[serde(default = "default_reference_sd")]
    pub reference_sd: f64,

    /// Weighted markers
    pub weights: Vec<SnpWeight>,
}

fn default_reference_sd() -> f64 {
    1.0
}

impl ScoreModel {
    /// Score a genome against this model.
    fn score(&self, index: &HashMap<&str, &Variant>) -> Score {
        let (raw, matched) = self
            .weights
            .iter()
            .filter_map(|w| {
                index
                    .get(w.rsid.as_str())
                    .map(|v| f64::from(v.dosage(&w.effect_allele)) * w.beta)
            })
            .fold((0.0, 0usize), |(sum, n), contribution| (sum + contribution, n + 1));

        let z = (raw - self.reference_mean) / self.reference_sd;
        let percentile = (normal_cdf(z) * 1000.0).round() / 10.0;

        tracing::trace!(
            model = %self.id,
            matched,
            total = self.weights.len(),
            raw,
            percentile,
            "Scored model"
        );

        Score {
            target: self.target.clone(),
            trait_label: self.trait_label.clone(),
            source_id: self.id.clone(),
            percentile,
            display_name: self.name.clone(),
        }
    }
}

/// Score-computation stage.
///
/// Every catalog model whose target is in `targets` contributes one score.
/// Targets without a model are skipped, so the result may cover a subset of
/// the requested targets. Fails only when `targets` is empty.
pub fn compute_scores(
    targets: &TargetSet,
    variants: &VariantSet,
    catalog: &[ScoreModel],
) -> Result<ScoreSet, StageError> {
    if targets.is_empty() {
        return Err(StageError::EmptyTargetSet);
    }

    let index: HashMap<&str, &Variant> = variants.iter().map(|v| (v.rsid.as_str(), v)).collect();

    let scores: Vec<Score> = catalog
        .iter()
        .filter(|model| targets.contains(&model.target))
        .map(|model| model.score(&index))
        .collect();

    tracing::debug!(
        targets = targets.len(),
        scores = scores.len(),
        "Computed polygenic scores"
    );

    Ok(ScoreSet::new(scores))
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(z: f64) -> f64 {
    (1.0 + erf(z / std::f64::consts::SQRT_2)) / 2.0
}

/// Error function, Abramowitz and Stegun 7.1.26 (|error| < 1.5e-7).
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}
