//! Hot-swappable model handle for application-wide use
//!
//! Readers take an `Arc` snapshot and keep scoring against it while a new model
//! is trained elsewhere; `replace` swaps the pointer in one step so no reader
//! ever observes a half-built model.

use crate::naive_bayes::{PredictionResult, TrainedModel};
use parking_lot::RwLock;
use prioritas_core::{Complaint, Result};
use std::sync::Arc;
use tracing::info;

/// Shared single-writer/multi-reader model slot
pub struct SharedModel {
    current: Arc<RwLock<Arc<TrainedModel>>>,
}

impl SharedModel {
    /// Create a new shared handle
    pub fn new(model: TrainedModel) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(model))),
        }
    }

    /// Snapshot of the model currently being served
    pub fn current(&self) -> Arc<TrainedModel> {
        Arc::clone(&self.current.read())
    }

    /// Install a retrained model, returning the one it supersedes
    pub fn replace(&self, model: TrainedModel) -> Arc<TrainedModel> {
        let next = Arc::new(model);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        info!(
            previous_records = previous.total_records(),
            records = self.current.read().total_records(),
            "Swapped serving model"
        );
        previous
    }

    /// Predict against the current snapshot
    pub fn predict(&self, complaint: &Complaint) -> Result<PredictionResult> {
        self.current().predict(complaint)
    }
}

impl Clone for SharedModel {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naive_bayes::train;
    use crate::significance::select_features;
    use prioritas_core::{Category, PriorityLabel, UrgencyLevel};
    use std::thread;

    fn model(flip: bool) -> TrainedModel {
        let batch: Vec<Complaint> = (0..12)
            .map(|i| {
                let urgent = i % 2 == 0;
                let label = if urgent != flip {
                    PriorityLabel::Tinggi
                } else {
                    PriorityLabel::Rendah
                };
                let urgency = if urgent {
                    UrgencyLevel::SangatMendesak
                } else {
                    UrgencyLevel::Normal
                };
                Complaint::new(format!("c-{}", i), Category::Kesehatan, urgency).with_priority(label)
            })
            .collect();
        let selected = select_features(&batch, 0.05).unwrap();
        train(&batch, &selected).unwrap()
    }

    #[test]
    fn test_replace_returns_previous() {
        let shared = SharedModel::new(model(false));
        let urgent = Complaint::new("n", Category::Kesehatan, UrgencyLevel::SangatMendesak);

        let snapshot = shared.current();
        assert_eq!(shared.predict(&urgent).unwrap().label, PriorityLabel::Tinggi);

        let previous = shared.replace(model(true));
        assert!(Arc::ptr_eq(&previous, &snapshot));
        assert_eq!(shared.predict(&urgent).unwrap().label, PriorityLabel::Rendah);

        // The old snapshot is untouched by the swap
        assert_eq!(snapshot.predict(&urgent).unwrap().label, PriorityLabel::Tinggi);
    }

    #[test]
    fn test_concurrent_readers() {
        let shared = SharedModel::new(model(false));
        let urgent = Complaint::new("n", Category::Kesehatan, UrgencyLevel::SangatMendesak);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                let urgent = urgent.clone();
                thread::spawn(move || {
                    (0..100)
                        .map(|_| shared.predict(&urgent).unwrap().label)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        shared.replace(model(true));

        for handle in handles {
            for label in handle.join().unwrap() {
                assert!(matches!(label, PriorityLabel::Tinggi | PriorityLabel::Rendah));
            }
        }
    }
}
