//! End-to-end prioritization pipeline
//!
//! This module chains the three components:
//! - Feature extraction backed by the area history of the training batch
//! - Chi-Square selection over the labelled batch
//! - Naive Bayes training on the selected features
//!
//! and ranks incoming complaints for the results table.

use crate::config::TriageConfig;
use crate::features::{AreaHistory, FeatureExtractor};
use crate::naive_bayes::{PredictionResult, PriorityClassifier, TrainedModel};
use crate::significance::{SelectedFeatureSet, SignificanceSelector};
use prioritas_core::{Complaint, ComplaintSource, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, info_span};

/// Selection and training bundled with their configuration
#[derive(Debug, Clone, Default)]
pub struct PrioritizationPipeline {
    config: TriageConfig,
}

/// Output of one training run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub selection: SelectedFeatureSet,
    pub model: TrainedModel,

    /// Total selection + training time
    pub total_latency_us: u64,
}

/// One complaint's place in the priority queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedComplaint {
    pub complaint_id: String,
    pub prediction: PredictionResult,
}

impl PrioritizationPipeline {
    pub fn new(config: TriageConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Extractor whose area history is the given batch
    pub fn extractor_for(&self, history: &[Complaint]) -> Result<FeatureExtractor> {
        FeatureExtractor::with_history(
            self.config.features.clone(),
            AreaHistory::from_complaints(history),
        )
    }

    /// Select features and train a model on one labelled batch
    pub fn run(&self, labeled: &[Complaint]) -> Result<PipelineRun> {
        let start = Instant::now();
        let extractor = self.extractor_for(labeled)?;

        let selection = {
            let _span = info_span!("select_features", records = labeled.len()).entered();
            SignificanceSelector::new(extractor.clone(), self.config.selection.clone())?
                .select(labeled)?
        };

        let model = {
            let _span = info_span!("train", features = selection.len()).entered();
            PriorityClassifier::new(extractor, self.config.classifier.clone())?
                .with_min_records(self.config.selection.min_records)
                .train(labeled, &selection)?
        };

        metrics::counter!("prioritas_trainings_total").increment(1);
        metrics::histogram!("prioritas_training_records").record(labeled.len() as f64);

        let total_latency_us = start.elapsed().as_micros() as u64;
        info!(
            selected = ?selection.names().collect::<Vec<_>>(),
            latency_us = total_latency_us,
            "Pipeline run complete"
        );

        Ok(PipelineRun {
            selection,
            model,
            total_latency_us,
        })
    }

    /// Train on the labelled records of a data source
    pub fn run_from_source(&self, source: &dyn ComplaintSource) -> Result<PipelineRun> {
        let labeled = source.labeled()?;
        self.run(&labeled)
    }

    /// Predict every complaint and order them most pressing first
    ///
    /// Ordering: label rank (tinggi first), then descending confidence, then id.
    pub fn prioritize(
        &self,
        model: &TrainedModel,
        complaints: &[Complaint],
    ) -> Result<Vec<RankedComplaint>> {
        let _span = info_span!("prioritize", complaints = complaints.len()).entered();

        let mut ranked = complaints
            .iter()
            .map(|complaint| {
                let prediction = model.predict(complaint)?;
                metrics::counter!("prioritas_predictions_total", "label" => prediction.label.as_str())
                    .increment(1);
                Ok(RankedComplaint {
                    complaint_id: complaint.id.clone(),
                    prediction,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        ranked.sort_by(|a, b| {
            a.prediction
                .label
                .rank()
                .cmp(&b.prediction.label.rank())
                .then_with(|| b.prediction.confidence.total_cmp(&a.prediction.confidence))
                .then_with(|| a.complaint_id.cmp(&b.complaint_id))
        });

        Ok(ranked)
    }
}
