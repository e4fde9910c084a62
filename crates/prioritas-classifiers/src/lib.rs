//! Prioritas Classifiers
//!
//! Complaint prioritization in three stages:
//! - Feature extraction: complaint → discretized categorical features
//! - Significance selection: Chi-Square test of each feature against the label
//! - Priority classification: Naive Bayes with additive smoothing over the
//!   selected features
//!
//! Every stage is a pure computation over its inputs. Trained models are
//! immutable values; [`SharedModel`] swaps them for concurrent readers.

pub mod config;
pub mod evaluation;
pub mod features;
pub mod naive_bayes;
pub mod pipeline;
pub mod shared;
pub mod significance;
pub mod stats;
#[cfg(feature = "synthetic")]
pub mod synthetic;

pub use config::{ClassifierConfig, FeatureConfig, SelectionConfig, TriageConfig};
pub use evaluation::{evaluate, split_holdout, ClassMetrics, EvaluationReport};
pub use features::{extract, AreaHistory, FeatureExtractor, FeatureVector};
pub use naive_bayes::{
    predict, train, ClassStats, FeatureTable, PredictionResult, PriorityClassifier, TrainedModel,
};
pub use pipeline::{PipelineRun, PrioritizationPipeline, RankedComplaint};
pub use shared::SharedModel;
pub use significance::{
    select_features, ContingencyTable, DegeneracyReason, DegenerateFeature, FeatureScore,
    SelectedFeatureSet, SignificanceSelector,
};
#[cfg(feature = "synthetic")]
pub use synthetic::SyntheticGenerator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::TriageConfig;
    pub use crate::features::{FeatureExtractor, FeatureVector};
    pub use crate::naive_bayes::{PredictionResult, PriorityClassifier, TrainedModel};
    pub use crate::pipeline::PrioritizationPipeline;
    pub use crate::shared::SharedModel;
    pub use crate::significance::{SelectedFeatureSet, SignificanceSelector};
}
