//! Chi-Square feature selection
//!
//! For every extracted feature a contingency table of feature value × priority
//! label is built over the labelled batch and tested for independence. Features
//! whose p-value falls below the threshold are selected, strongest first.
//! Features on which the test is undefined are reported as degenerate and left
//! out, never scored as zero.

use crate::config::{validate_threshold, FeatureConfig, SelectionConfig};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::stats::chi_square_p_value;
use prioritas_core::{Complaint, Error, PriorityLabel, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Observed counts of feature value × label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTable {
    /// Distinct observed feature values (rows), ascending
    pub values: Vec<String>,

    /// Distinct observed labels (columns)
    pub labels: Vec<PriorityLabel>,

    /// `counts[row][column]`
    pub counts: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Build the table for one feature; records lacking the feature are skipped
    pub fn from_samples(feature: &str, samples: &[(FeatureVector, PriorityLabel)]) -> Self {
        let observed: Vec<(&str, PriorityLabel)> = samples
            .iter()
            .filter_map(|(vector, label)| vector.get(feature).map(|v| (v, *label)))
            .collect();

        let values: Vec<String> = observed
            .iter()
            .map(|(v, _)| *v)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let labels: Vec<PriorityLabel> = observed
            .iter()
            .map(|(_, l)| *l)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut counts = vec![vec![0u64; labels.len()]; values.len()];
        for (value, label) in observed {
            // Both lookups succeed: rows and columns were built from `observed`.
            if let (Ok(row), Some(col)) = (
                values.binary_search_by(|v| v.as_str().cmp(value)),
                labels.iter().position(|l| *l == label),
            ) {
                counts[row][col] += 1;
            }
        }

        Self {
            values,
            labels,
            counts,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn row_total(&self, row: usize) -> u64 {
        self.counts[row].iter().sum()
    }

    pub fn column_total(&self, col: usize) -> u64 {
        self.counts.iter().map(|r| r[col]).sum()
    }

    /// Expected count of a cell under independence
    pub fn expected(&self, row: usize, col: usize) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.row_total(row) as f64 * self.column_total(col) as f64 / total as f64
    }

    pub fn degrees_of_freedom(&self) -> usize {
        self.values.len().saturating_sub(1) * self.labels.len().saturating_sub(1)
    }

    /// Pearson statistic `Σ (O − E)² / E`, or the degeneracy preventing it
    pub fn statistic(&self) -> std::result::Result<f64, DegeneracyReason> {
        if self.labels.len() < 2 {
            return Err(DegeneracyReason::SingleLabel {
                labels: self.labels.len(),
            });
        }
        if self.values.len() < 2 {
            return Err(DegeneracyReason::TooFewValues {
                distinct: self.values.len(),
            });
        }

        let mut statistic = 0.0;
        for (row, value) in self.values.iter().enumerate() {
            for (col, label) in self.labels.iter().enumerate() {
                let expected = self.expected(row, col);
                if expected <= 0.0 {
                    return Err(DegeneracyReason::ZeroExpectedCount {
                        value: value.clone(),
                        label: *label,
                    });
                }
                let diff = self.counts[row][col] as f64 - expected;
                statistic += diff * diff / expected;
            }
        }

        Ok(statistic)
    }
}

/// Chi-Square result for one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub feature: String,
    pub statistic: f64,
    pub degrees_of_freedom: usize,
    /// Always in `[0, 1]`
    pub p_value: f64,
    pub table: ContingencyTable,
}

impl FeatureScore {
    pub fn is_significant(&self, threshold: f64) -> bool {
        self.p_value < threshold
    }
}

/// Why a feature could not be tested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DegeneracyReason {
    /// The feature took fewer than two distinct values
    TooFewValues { distinct: usize },

    /// The batch holds fewer than two distinct labels
    SingleLabel { labels: usize },

    /// A cell's expected count is zero
    ZeroExpectedCount { value: String, label: PriorityLabel },
}

impl fmt::Display for DegeneracyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewValues { distinct } => {
                write!(f, "only {} distinct value(s) observed", distinct)
            }
            Self::SingleLabel { labels } => {
                write!(f, "only {} distinct label(s) in the batch", labels)
            }
            Self::ZeroExpectedCount { value, label } => {
                write!(f, "expected count is zero for value '{}' × label '{}'", value, label)
            }
        }
    }
}

/// A feature excluded from selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegenerateFeature {
    pub feature: String,
    pub reason: DegeneracyReason,
}

/// Outcome of one selection run
///
/// `features` holds the selected scores by descending statistic. Scored but
/// insignificant features and degenerate ones are kept for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedFeatureSet {
    pub features: Vec<FeatureScore>,
    pub rejected: Vec<FeatureScore>,
    pub degenerate: Vec<DegenerateFeature>,
    pub threshold: f64,
    pub record_count: usize,
}

impl SelectedFeatureSet {
    /// Selected feature names, strongest first
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|s| s.feature.as_str())
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.features.iter().any(|s| s.feature == feature)
    }

    /// Score of a selected feature
    pub fn get(&self, feature: &str) -> Option<&FeatureScore> {
        self.features.iter().find(|s| s.feature == feature)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Every scored feature, selected or not, by descending statistic
    pub fn all_scores(&self) -> Vec<&FeatureScore> {
        let mut scores: Vec<&FeatureScore> =
            self.features.iter().chain(self.rejected.iter()).collect();
        scores.sort_by(|a, b| by_strength(a, b));
        scores
    }
}

/// Chi-Square significance selector
#[derive(Debug, Clone)]
pub struct SignificanceSelector {
    extractor: FeatureExtractor,
    config: SelectionConfig,
}

impl SignificanceSelector {
    pub fn new(extractor: FeatureExtractor, config: SelectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { extractor, config })
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Select with the configured threshold
    pub fn select(&self, labeled: &[Complaint]) -> Result<SelectedFeatureSet> {
        self.select_features(labeled, self.config.p_value_threshold)
    }

    /// Score every feature of the batch and keep those with `p < threshold`
    ///
    /// # Errors
    ///
    /// - `Config` if `threshold` is outside `(0, 1)`
    /// - `InsufficientData` if the batch is smaller than `min_records`
    /// - `InvalidComplaint` if a record cannot be extracted or has no label
    pub fn select_features(
        &self,
        labeled: &[Complaint],
        threshold: f64,
    ) -> Result<SelectedFeatureSet> {
        validate_threshold(threshold)?;
        if labeled.len() < self.config.min_records {
            return Err(Error::insufficient_data(self.config.min_records, labeled.len()));
        }

        let samples = self.extractor.extract_labeled(labeled)?;
        let selection = select_from_samples(&samples, threshold);

        info!(
            records = selection.record_count,
            selected = selection.features.len(),
            rejected = selection.rejected.len(),
            degenerate = selection.degenerate.len(),
            threshold,
            "Chi-Square feature selection complete"
        );

        Ok(selection)
    }
}

/// Run the selection over already-extracted samples
pub(crate) fn select_from_samples(
    samples: &[(FeatureVector, PriorityLabel)],
    threshold: f64,
) -> SelectedFeatureSet {
    let feature_names: BTreeSet<&str> = samples.iter().flat_map(|(v, _)| v.names()).collect();

    let mut selected = Vec::new();
    let mut rejected = Vec::new();
    let mut degenerate = Vec::new();

    for feature in feature_names {
        let table = ContingencyTable::from_samples(feature, samples);

        match table.statistic() {
            Ok(statistic) => {
                let degrees_of_freedom = table.degrees_of_freedom();
                let p_value = chi_square_p_value(statistic, degrees_of_freedom);
                debug!(feature, statistic, degrees_of_freedom, p_value, "Scored feature");

                let score = FeatureScore {
                    feature: feature.to_string(),
                    statistic,
                    degrees_of_freedom,
                    p_value,
                    table,
                };
                if score.is_significant(threshold) {
                    selected.push(score);
                } else {
                    rejected.push(score);
                }
            }
            Err(reason) => {
                debug!(feature, %reason, "Feature is degenerate");
                degenerate.push(DegenerateFeature {
                    feature: feature.to_string(),
                    reason,
                });
            }
        }
    }

    selected.sort_by(by_strength);
    rejected.sort_by(by_strength);

    SelectedFeatureSet {
        features: selected,
        rejected,
        degenerate,
        threshold,
        record_count: samples.len(),
    }
}

/// Descending statistic, then ascending name
fn by_strength(a: &FeatureScore, b: &FeatureScore) -> Ordering {
    b.statistic
        .total_cmp(&a.statistic)
        .then_with(|| a.feature.cmp(&b.feature))
}

/// Select with default extraction and selection settings
pub fn select_features(labeled: &[Complaint], threshold: f64) -> Result<SelectedFeatureSet> {
    let history = crate::features::AreaHistory::from_complaints(labeled);
    let extractor = FeatureExtractor::with_history(FeatureConfig::default(), history)?;
    SignificanceSelector::new(extractor, SelectionConfig::default())?
        .select_features(labeled, threshold)
}
