//! Categorical Naive Bayes priority classifier
//!
//! Training counts label priors and per-(feature, value) conditional
//! frequencies over the selected features with additive smoothing:
//!
//! ```text
//! P(v | l) = (count(f = v, l) + α) / (count(l) + α × V_f)
//! ```
//!
//! where `V_f` is the number of distinct values of `f` seen in training.
//! Inference sums log-probabilities per label, normalizes with log-sum-exp and
//! reports the argmax with its posterior as confidence.

use crate::config::{ClassifierConfig, FeatureConfig, SelectionConfig};
use crate::features::{AreaHistory, FeatureExtractor, FeatureVector};
use crate::significance::SelectedFeatureSet;
use prioritas_core::{Complaint, Error, PriorityLabel, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Posteriors closer than this are treated as tied
const TIE_EPSILON: f64 = 1e-12;

/// Per-label training mass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    pub count: usize,
    pub prior: f64,
}

/// Smoothed conditional probabilities of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    /// Distinct values observed in training (`V_f`)
    pub distinct_values: usize,

    /// Multiplier on this feature's log-likelihood
    pub weight: f64,

    /// Value → label → `P(value | label)`
    pub probabilities: BTreeMap<String, BTreeMap<PriorityLabel, f64>>,

    /// Label → probability assigned to a value never seen in training
    pub unseen: BTreeMap<PriorityLabel, f64>,
}

impl FeatureTable {
    /// `P(value | label)`, falling back to the smoothed unseen mass
    pub fn probability(&self, value: &str, label: PriorityLabel) -> Option<f64> {
        self.probabilities
            .get(value)
            .and_then(|by_label| by_label.get(&label))
            .or_else(|| self.unseen.get(&label))
            .copied()
    }
}

/// Immutable result of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    selected: SelectedFeatureSet,
    classes: BTreeMap<PriorityLabel, ClassStats>,
    tables: BTreeMap<String, FeatureTable>,
    alpha: f64,
    total_records: usize,
    extractor: FeatureExtractor,
}

/// Prediction for one complaint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: PriorityLabel,

    /// Posterior of `label`
    pub confidence: f64,

    /// Posterior of every label seen in training, each strictly positive
    ///
    /// Labels absent from the training batch have no entry: the model holds no
    /// evidence about them.
    pub posteriors: BTreeMap<PriorityLabel, f64>,
}

impl PredictionResult {
    /// Posterior of `label`, `None` if the model never saw that label
    pub fn posterior(&self, label: PriorityLabel) -> Option<f64> {
        self.posteriors.get(&label).copied()
    }
}

impl TrainedModel {
    pub fn selected_features(&self) -> &SelectedFeatureSet {
        &self.selected
    }

    pub fn classes(&self) -> &BTreeMap<PriorityLabel, ClassStats> {
        &self.classes
    }

    pub fn feature_table(&self, feature: &str) -> Option<&FeatureTable> {
        self.tables.get(feature)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn prior(&self, label: PriorityLabel) -> f64 {
        self.classes.get(&label).map(|c| c.prior).unwrap_or(0.0)
    }

    /// Fail unless the model can score anything
    pub fn ensure_trained(&self) -> Result<()> {
        if self.total_records == 0 || self.classes.is_empty() {
            return Err(Error::untrained("model has zero training records"));
        }
        if self.selected.is_empty() || self.tables.is_empty() {
            return Err(Error::untrained(format!(
                "no features were selected at threshold {} ({} degenerate, {} not significant)",
                self.selected.threshold,
                self.selected.degenerate.len(),
                self.selected.rejected.len()
            )));
        }
        Ok(())
    }

    /// Extract and score a complaint
    pub fn predict(&self, complaint: &Complaint) -> Result<PredictionResult> {
        self.ensure_trained()?;
        let vector = self.extractor.extract(complaint)?;
        self.predict_vector(&vector)
    }

    /// Score an already-extracted vector; features outside the selection are ignored
    pub fn predict_vector(&self, vector: &FeatureVector) -> Result<PredictionResult> {
        self.ensure_trained()?;

        let log_scores: Vec<(PriorityLabel, f64)> = self
            .classes
            .iter()
            .map(|(label, stats)| {
                let mut score = stats.prior.ln();
                for (feature, table) in &self.tables {
                    let Some(value) = vector.get(feature) else {
                        continue;
                    };
                    if let Some(p) = table.probability(value, *label) {
                        score += table.weight * p.ln();
                    }
                }
                (*label, score)
            })
            .collect();

        let max = log_scores
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);
        let norm: f64 = log_scores.iter().map(|(_, s)| (s - max).exp()).sum();

        // Floor at the smallest positive value: no label is reported as impossible.
        let posteriors: BTreeMap<PriorityLabel, f64> = log_scores
            .iter()
            .map(|(label, s)| (*label, ((s - max).exp() / norm).max(f64::MIN_POSITIVE)))
            .collect();

        let (label, confidence) = self
            .choose(&posteriors)
            .ok_or_else(|| Error::untrained("model has no labels"))?;

        Ok(PredictionResult {
            label,
            confidence,
            posteriors,
        })
    }

    /// Argmax with ties resolved inside the group within `TIE_EPSILON` of the
    /// best posterior: higher prior first, then the alphabetically first label.
    fn choose(&self, posteriors: &BTreeMap<PriorityLabel, f64>) -> Option<(PriorityLabel, f64)> {
        let best = posteriors.values().copied().fold(f64::NEG_INFINITY, f64::max);
        posteriors
            .iter()
            .filter(|(_, p)| best - **p <= TIE_EPSILON)
            .map(|(l, p)| (*l, *p))
            .max_by(|a, b| self.tie_break(a.0, b.0))
    }

    /// Total order among tied labels; `max_by` picks the greatest
    fn tie_break(&self, a: PriorityLabel, b: PriorityLabel) -> Ordering {
        self.prior(a)
            .total_cmp(&self.prior(b))
            .then_with(|| b.as_str().cmp(a.as_str()))
    }

    /// Write the model as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Read a model written by [`TrainedModel::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Trains [`TrainedModel`]s
#[derive(Debug, Clone)]
pub struct PriorityClassifier {
    extractor: FeatureExtractor,
    config: ClassifierConfig,
    min_records: usize,
}

impl PriorityClassifier {
    pub fn new(extractor: FeatureExtractor, config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor,
            config,
            min_records: SelectionConfig::default().min_records,
        })
    }

    /// Override the minimum training size
    pub fn with_min_records(mut self, min_records: usize) -> Self {
        self.min_records = min_records;
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Train on a labelled batch, restricted to `selected`
    ///
    /// # Errors
    ///
    /// - `InsufficientData` if the batch is smaller than the minimum
    /// - `InvalidComplaint` if a record cannot be extracted or has no label
    pub fn train(
        &self,
        labeled: &[Complaint],
        selected: &SelectedFeatureSet,
    ) -> Result<TrainedModel> {
        if labeled.len() < self.min_records {
            return Err(Error::insufficient_data(self.min_records, labeled.len()));
        }

        let samples = self.extractor.extract_labeled(labeled)?;
        let total = samples.len();
        let alpha = self.config.alpha;

        let mut label_counts: BTreeMap<PriorityLabel, usize> = BTreeMap::new();
        for (_, label) in &samples {
            *label_counts.entry(*label).or_insert(0) += 1;
        }

        let classes: BTreeMap<PriorityLabel, ClassStats> = label_counts
            .iter()
            .map(|(label, count)| {
                (
                    *label,
                    ClassStats {
                        count: *count,
                        prior: *count as f64 / total as f64,
                    },
                )
            })
            .collect();

        let mut tables = BTreeMap::new();
        for feature in selected.names() {
            let mut counts: BTreeMap<&str, BTreeMap<PriorityLabel, usize>> = BTreeMap::new();
            for (vector, label) in &samples {
                if let Some(value) = vector.get(feature) {
                    *counts.entry(value).or_default().entry(*label).or_insert(0) += 1;
                }
            }

            let distinct = counts.len();
            let smoothed = |n: usize, label_count: usize| {
                (n as f64 + alpha) / (label_count as f64 + alpha * distinct as f64)
            };

            let probabilities = counts
                .iter()
                .map(|(value, by_label)| {
                    let row = label_counts
                        .iter()
                        .map(|(label, label_count)| {
                            let n = by_label.get(label).copied().unwrap_or(0);
                            (*label, smoothed(n, *label_count))
                        })
                        .collect();
                    (value.to_string(), row)
                })
                .collect();
            let unseen = label_counts
                .iter()
                .map(|(label, label_count)| (*label, smoothed(0, *label_count)))
                .collect();

            debug!(feature, distinct_values = distinct, "Built conditional table");
            tables.insert(
                feature.to_string(),
                FeatureTable {
                    distinct_values: distinct,
                    weight: self.config.weight_for(feature),
                    probabilities,
                    unseen,
                },
            );
        }

        info!(
            records = total,
            labels = classes.len(),
            features = tables.len(),
            alpha,
            "Trained Naive Bayes model"
        );

        Ok(TrainedModel {
            selected: selected.clone(),
            classes,
            tables,
            alpha,
            total_records: total,
            extractor: self.extractor.clone(),
        })
    }
}

/// Train with default settings and an area history built from the batch
pub fn train(labeled: &[Complaint], selected: &SelectedFeatureSet) -> Result<TrainedModel> {
    let history = AreaHistory::from_complaints(labeled);
    let extractor = FeatureExtractor::with_history(FeatureConfig::default(), history)?;
    PriorityClassifier::new(extractor, ClassifierConfig::default())?.train(labeled, selected)
}

/// Predict the priority of one complaint
pub fn predict(model: &TrainedModel, complaint: &Complaint) -> Result<PredictionResult> {
    model.predict(complaint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::names;
    use crate::significance::select_features;
    use prioritas_core::{Category, UrgencyLevel};

    /// 6 tinggi (4 infrastruktur, 2 kesehatan), 4 rendah (all pendidikan), urgency split
    fn batch() -> Vec<Complaint> {
        let mut out = Vec::new();
        for i in 0..6 {
            let category = if i < 4 {
                Category::Infrastruktur
            } else {
                Category::Kesehatan
            };
            out.push(
                Complaint::new(format!("t-{}", i), category, UrgencyLevel::SangatMendesak)
                    .with_priority(PriorityLabel::Tinggi),
            );
        }
        for i in 0..4 {
            out.push(
                Complaint::new(format!("r-{}", i), Category::Pendidikan, UrgencyLevel::Normal)
                    .with_priority(PriorityLabel::Rendah),
            );
        }
        out
    }

    fn trained() -> TrainedModel {
        let batch = batch();
        let selected = select_features(&batch, 0.05).unwrap();
        train(&batch, &selected).unwrap()
    }

    #[test]
    fn test_priors_and_smoothed_table() {
        let model = trained();

        assert_eq!(model.total_records(), 10);
        assert!((model.prior(PriorityLabel::Tinggi) - 0.6).abs() < 1e-12);
        assert!((model.prior(PriorityLabel::Rendah) - 0.4).abs() < 1e-12);
        assert_eq!(model.prior(PriorityLabel::Sedang), 0.0);

        let table = model.feature_table(names::CATEGORY).unwrap();
        assert_eq!(table.distinct_values, 3);
        // (4 + 1) / (6 + 3)
        let p = table.probability("infrastruktur", PriorityLabel::Tinggi).unwrap();
        assert!((p - 5.0 / 9.0).abs() < 1e-12);
        // (0 + 1) / (4 + 3)
        let p = table.probability("infrastruktur", PriorityLabel::Rendah).unwrap();
        assert!((p - 1.0 / 7.0).abs() < 1e-12);
        // Never-seen value gets the same unseen mass
        let p = table.probability("sosial", PriorityLabel::Rendah).unwrap();
        assert!((p - 1.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_posteriors_are_normalized_and_nonzero() {
        let model = trained();
        let complaint = Complaint::new("n", Category::Sosial, UrgencyLevel::Mendesak);
        let result = predict(&model, &complaint).unwrap();

        let sum: f64 = result.posteriors.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(result.posteriors.values().all(|p| *p > 0.0));
        assert_eq!(result.posterior(result.label), Some(result.confidence));
        // Sedang never appeared in training
        assert_eq!(result.posterior(PriorityLabel::Sedang), None);
    }

    #[test]
    fn test_training_example_recovers_label() {
        let model = trained();
        for complaint in batch() {
            let result = model.predict(&complaint).unwrap();
            assert_eq!(Some(result.label), complaint.priority, "{}", complaint.id);
            assert!(result.confidence > 0.5);
        }
    }

    #[test]
    fn test_tie_prefers_higher_prior_then_alphabetical() {
        let model = trained();
        assert_eq!(
            model.tie_break(PriorityLabel::Tinggi, PriorityLabel::Rendah),
            Ordering::Greater
        );

        let tied = BTreeMap::from([(PriorityLabel::Tinggi, 0.5), (PriorityLabel::Rendah, 0.5)]);
        assert_eq!(model.choose(&tied), Some((PriorityLabel::Tinggi, 0.5)));

        let mut equal_priors = model.clone();
        for stats in equal_priors.classes.values_mut() {
            stats.prior = 0.5;
        }
        // rendah < tinggi alphabetically, so rendah wins
        assert_eq!(equal_priors.choose(&tied), Some((PriorityLabel::Rendah, 0.5)));
    }

    #[test]
    fn test_tie_group_is_anchored_at_best_posterior() {
        let model = trained();

        // Sedang ties with both neighbours pairwise, but tinggi sits outside the
        // group around the best posterior and must not win on its higher prior.
        let chained = BTreeMap::from([
            (PriorityLabel::Tinggi, 0.5 - 1.6e-12),
            (PriorityLabel::Sedang, 0.5 - 0.8e-12),
            (PriorityLabel::Rendah, 0.5),
        ]);
        assert_eq!(model.choose(&chained), Some((PriorityLabel::Rendah, 0.5)));

        let clear = BTreeMap::from([(PriorityLabel::Tinggi, 0.3), (PriorityLabel::Rendah, 0.7)]);
        assert_eq!(model.choose(&clear), Some((PriorityLabel::Rendah, 0.7)));
    }

    #[test]
    fn test_untrained_model() {
        let batch = batch();
        let mut selected = select_features(&batch, 0.05).unwrap();
        selected.features.clear();
        let model = train(&batch, &selected).unwrap();

        let err = model.predict(&batch[0]).unwrap_err();
        assert!(matches!(err, Error::UntrainedModel(_)));
    }

    #[test]
    fn test_insufficient_training_data() {
        let batch = batch();
        let selected = select_features(&batch, 0.05).unwrap();
        let err = train(&batch[..9], &selected).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { required: 10, actual: 9 }));
    }

    #[test]
    fn test_feature_weight_zero_ignores_feature() {
        let batch = batch();
        let selected = select_features(&batch, 0.05).unwrap();
        let extractor = FeatureExtractor::new(FeatureConfig::default()).unwrap();
        let mut config = ClassifierConfig::default();
        for feature in selected.names() {
            config.feature_weights.insert(feature.to_string(), 0.0);
        }
        let model = PriorityClassifier::new(extractor, config)
            .unwrap()
            .train(&batch, &selected)
            .unwrap();

        // With all evidence weighted out the posterior equals the prior.
        let result = model.predict(&batch[9]).unwrap();
        assert_eq!(result.label, PriorityLabel::Tinggi);
        assert!((result.confidence - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_save_and_load() {
        let model = trained();
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");

        model.save(&path).unwrap();
        let loaded = TrainedModel::load(&path).unwrap();

        assert_eq!(loaded.classes().len(), model.classes().len());
        assert_eq!(
            loaded.selected_features().names().collect::<Vec<_>>(),
            model.selected_features().names().collect::<Vec<_>>()
        );

        let complaint = Complaint::new("n", Category::Kesehatan, UrgencyLevel::SangatMendesak);
        let before = model.predict(&complaint).unwrap();
        let after = loaded.predict(&complaint).unwrap();
        assert_eq!(before.label, after.label);
        assert!((before.confidence - after.confidence).abs() < 1e-9);
    }
}
