//! Configuration loading for the command line

use prioritas_classifiers::TriageConfig;
use std::path::Path;
use tracing::{debug, info};

/// Overrides taken from command-line flags
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub threshold: Option<f64>,
    pub alpha: Option<f64>,
}

/// Load configuration from file and CLI overrides
///
/// A missing file is not an error: the defaults are used instead. The merged
/// result is validated, so an out-of-range flag is rejected here.
pub fn load(config_path: &Path, overrides: Overrides) -> anyhow::Result<TriageConfig> {
    let mut config = if config_path.exists() {
        info!(path = %config_path.display(), "Loading configuration");
        TriageConfig::from_file(config_path)?
    } else {
        debug!(path = %config_path.display(), "No configuration file, using defaults");
        TriageConfig::default()
    };

    if let Some(threshold) = overrides.threshold {
        config.selection.p_value_threshold = threshold;
    }
    if let Some(alpha) = overrides.alpha {
        config.classifier.alpha = alpha;
    }

    config.validate()?;
    Ok(config)
}
