//! Hold-out evaluation of a trained model

use crate::naive_bayes::TrainedModel;
use prioritas_core::{Complaint, Error, PriorityLabel, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Precision, recall and F1 for one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Records whose ground truth is this label
    pub support: usize,
}

/// Accuracy and confusion matrix over a labelled batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    /// Actual → predicted → count
    pub confusion: BTreeMap<PriorityLabel, BTreeMap<PriorityLabel, usize>>,
    pub per_class: BTreeMap<PriorityLabel, ClassMetrics>,
}

impl EvaluationReport {
    /// Build a report from (actual, predicted) pairs
    pub fn from_pairs(pairs: &[(PriorityLabel, PriorityLabel)]) -> Self {
        let mut confusion: BTreeMap<PriorityLabel, BTreeMap<PriorityLabel, usize>> =
            BTreeMap::new();
        for (actual, predicted) in pairs {
            *confusion
                .entry(*actual)
                .or_default()
                .entry(*predicted)
                .or_insert(0) += 1;
        }

        let cell = |actual: PriorityLabel, predicted: PriorityLabel| {
            confusion
                .get(&actual)
                .and_then(|row| row.get(&predicted))
                .copied()
                .unwrap_or(0)
        };

        let labels: BTreeSet<PriorityLabel> = pairs.iter().flat_map(|(a, p)| [*a, *p]).collect();
        let per_class = labels
            .iter()
            .map(|label| {
                let tp = cell(*label, *label);
                let support = pairs.iter().filter(|(a, _)| a == label).count();
                let predicted = pairs.iter().filter(|(_, p)| p == label).count();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                (
                    *label,
                    ClassMetrics {
                        precision,
                        recall,
                        f1,
                        support,
                    },
                )
            })
            .collect();

        let correct = pairs.iter().filter(|(a, p)| a == p).count();

        Self {
            total: pairs.len(),
            correct,
            accuracy: ratio(correct, pairs.len()),
            confusion,
            per_class,
        }
    }

    /// Unweighted mean F1 across labels
    pub fn macro_f1(&self) -> f64 {
        if self.per_class.is_empty() {
            return 0.0;
        }
        self.per_class.values().map(|m| m.f1).sum::<f64>() / self.per_class.len() as f64
    }
}

/// Predict every record and compare against its ground truth
pub fn evaluate(model: &TrainedModel, labeled: &[Complaint]) -> Result<EvaluationReport> {
    if labeled.is_empty() {
        return Err(Error::insufficient_data(1, 0));
    }

    let pairs = labeled
        .iter()
        .map(|complaint| {
            let actual = complaint
                .priority
                .ok_or_else(|| Error::invalid_complaint(&complaint.id, "missing priority label"))?;
            Ok((actual, model.predict(complaint)?.label))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(EvaluationReport::from_pairs(&pairs))
}

/// Split into (train, test) with evenly spaced test records
///
/// Deterministic: the same batch and fraction always give the same split.
pub fn split_holdout(
    records: &[Complaint],
    test_fraction: f64,
) -> Result<(Vec<Complaint>, Vec<Complaint>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::config(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    let n = records.len();
    if n < 2 {
        return Err(Error::insufficient_data(2, n));
    }

    let test_count = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);

    let mut train = Vec::with_capacity(n - test_count);
    let mut test = Vec::with_capacity(test_count);
    for (i, record) in records.iter().enumerate() {
        // Bresenham-style spacing picks exactly `test_count` indices.
        if (i + 1) * test_count / n > i * test_count / n {
            test.push(record.clone());
        } else {
            train.push(record.clone());
        }
    }

    Ok((train, test))
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
