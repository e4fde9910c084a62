//! Configuration for feature extraction, selection and classification

use prioritas_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level configuration for the prioritization engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Feature bucketing
    #[serde(default)]
    pub features: FeatureConfig,

    /// Chi-Square selection
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Naive Bayes training
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Bucket boundaries and keyword lists used by the feature extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Descriptions shorter than this many characters are `short`
    #[serde(default = "default_short_max_chars")]
    pub short_max_chars: usize,

    /// Descriptions shorter than this many characters are `medium`
    #[serde(default = "default_medium_max_chars")]
    pub medium_max_chars: usize,

    /// Areas with at most this many other recorded complaints are `low` density
    #[serde(default = "default_density_low_max")]
    pub density_low_max: usize,

    /// Areas with at most this many other recorded complaints are `medium` density
    #[serde(default = "default_density_medium_max")]
    pub density_medium_max: usize,

    /// Case-insensitive keywords that flag a hazard in the description
    #[serde(default = "default_hazard_keywords")]
    pub hazard_keywords: Vec<String>,
}

/// Chi-Square selection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Features are selected when their p-value is strictly below this
    #[serde(default = "default_p_value_threshold")]
    pub p_value_threshold: f64,

    /// Minimum labelled records for selection and training
    #[serde(default = "default_min_records")]
    pub min_records: usize,
}

/// Naive Bayes parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Additive (Laplace) smoothing constant
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Optional per-feature scaling of log-likelihood contributions
    ///
    /// Features not listed use a weight of 1.0.
    #[serde(default)]
    pub feature_weights: BTreeMap<String, f64>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            short_max_chars: default_short_max_chars(),
            medium_max_chars: default_medium_max_chars(),
            density_low_max: default_density_low_max(),
            density_medium_max: default_density_medium_max(),
            hazard_keywords: default_hazard_keywords(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            p_value_threshold: default_p_value_threshold(),
            min_records: default_min_records(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            feature_weights: BTreeMap::new(),
        }
    }
}

impl TriageConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Check every section for out-of-range values
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.selection.validate()?;
        self.classifier.validate()
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.short_max_chars == 0 || self.short_max_chars >= self.medium_max_chars {
            return Err(Error::config(format!(
                "description buckets must satisfy 0 < short_max_chars ({}) < medium_max_chars ({})",
                self.short_max_chars, self.medium_max_chars
            )));
        }
        if self.density_low_max >= self.density_medium_max {
            return Err(Error::config(format!(
                "density buckets must satisfy density_low_max ({}) < density_medium_max ({})",
                self.density_low_max, self.density_medium_max
            )));
        }
        if self.hazard_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(Error::config("hazard keywords must not be blank"));
        }
        Ok(())
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.p_value_threshold)?;
        if self.min_records == 0 {
            return Err(Error::config("min_records must be at least 1"));
        }
        Ok(())
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(Error::config(format!(
                "smoothing alpha must be a positive number, got {}",
                self.alpha
            )));
        }
        for (feature, weight) in &self.feature_weights {
            if !(weight.is_finite() && *weight >= 0.0) {
                return Err(Error::config(format!(
                    "weight for feature '{}' must be a non-negative number, got {}",
                    feature, weight
                )));
            }
        }
        Ok(())
    }

    /// Weight applied to a feature's log-likelihood
    pub fn weight_for(&self, feature: &str) -> f64 {
        self.feature_weights.get(feature).copied().unwrap_or(1.0)
    }
}

/// p-value thresholds must lie in the open interval (0, 1)
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold > 0.0 && threshold < 1.0 {
        Ok(())
    } else {
        Err(Error::config(format!(
            "p-value threshold must be in (0, 1), got {}",
            threshold
        )))
    }
}

fn default_short_max_chars() -> usize {
    50
}

fn default_medium_max_chars() -> usize {
    200
}

fn default_density_low_max() -> usize {
    2
}

fn default_density_medium_max() -> usize {
    9
}

fn default_hazard_keywords() -> Vec<String> {
    [
        "bahaya",
        "darurat",
        "banjir",
        "longsor",
        "kebakaran",
        "roboh",
        "ambruk",
        "putus",
        "korban",
        "wabah",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
}

fn default_p_value_threshold() -> f64 {
    0.05
}

fn default_min_records() -> usize {
    10
}

fn default_alpha() -> f64 {
    1.0
}
