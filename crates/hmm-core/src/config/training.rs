//! Training settings file (`training.json`).

use serde::{Deserialize, Serialize};

use super::CONFIG_SCHEMA_VERSION;
use crate::inference::TrainOptions;

/// Baum-Welch driver settings.
///
/// ```json
/// { "schema_version": "1.0.0", "max_iterations": 200, "tolerance": 1e-8 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    pub schema_version: String,
    /// Upper bound on `improve` calls per training run.
    pub max_iterations: usize,
    /// Stop once the log-likelihood changes by less than this.
    pub tolerance: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let options = TrainOptions::default();
        TrainingConfig {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            max_iterations: options.max_iterations,
            tolerance: options.tolerance,
        }
    }
}

impl TrainingConfig {
    pub fn train_options(&self) -> TrainOptions {
        TrainOptions {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }
}
