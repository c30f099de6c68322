//! Analysis-domain configuration.
//!
//! A domain is static configuration data: the target identifiers relevant
//! to an analysis and the score models available for them. It is loaded
//! from YAML/JSON or taken from the built-in cardiometabolic panel.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::scoring::ScoreModel;
use crate::types::{TargetId, TargetSet, VariantSet};

const CARDIOMETABOLIC_YAML: &str = include_str!("../data/cardiometabolic.yaml");

/// Errors that can occur when loading a domain.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Failed to read domain file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Domain validation failed: {0}")]
    ValidationError(String),
}

/// Targets and score catalog for one analysis domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Short domain name (e.g., "cardiometabolic")
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Target identifiers scored for this domain, in order
    pub targets: Vec<TargetId>,

    /// Score models, keyed by their `target`
    #[serde(default)]
    pub catalog: Vec<ScoreModel>,
}

impl DomainConfig {
    /// The built-in cardiometabolic panel.
    pub fn cardiometabolic() -> Self {
        match Self::from_yaml(CARDIOMETABOLIC_YAML) {
            Ok(domain) => domain,
            Err(e) => {
                tracing::error!(error = %e, "Built-in domain is invalid, using bare target list");
                Self {
                    name: "cardiometabolic".to_string(),
                    description: None,
                    targets: Vec::new(),
                    catalog: Vec::new(),
                }
            }
        }
    }

    /// Parse a domain from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, DomainError> {
        let domain: DomainConfig = serde_yaml::from_str(yaml)?;
        domain.validate()?;
        Ok(domain)
    }

    /// Parse a domain from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let domain: DomainConfig = serde_json::from_str(json)?;
        domain.validate()?;
        Ok(domain)
    }

    /// Parse a domain from a YAML or JSON file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Target-selection stage.
    ///
    /// Total: always returns the configured target list. The variants are
    /// accepted so that content-dependent selection can be added without
    /// changing callers; they are not consulted today.
    pub fn select_targets(&self, _variants: &VariantSet) -> TargetSet {
        TargetSet::new(self.targets.iter().cloned())
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingField("name".to_string()));
        }

        if self.targets.is_empty() {
            return Err(DomainError::MissingField("targets".to_string()));
        }

        let mut seen = HashSet::new();
        for model in &self.catalog {
            if !seen.insert(model.id.as_str()) {
                return Err(DomainError::ValidationError(format!(
                    "Duplicate score model id: {}",
                    model.id
                )));
            }
            if model.reference_sd.is_nan() || model.reference_sd <= 0.0 {
                return Err(DomainError::ValidationError(format!(
                    "Score model {} needs a positive reference_sd",
                    model.id
                )));
            }
            if model.weights.is_empty() {
                return Err(DomainError::ValidationError(format!(
                    "Score model {} has no weights",
                    model.id
                )));
            }
        }

        Ok(())
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self::cardiometabolic()
    }
}
