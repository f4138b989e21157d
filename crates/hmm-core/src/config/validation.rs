//! Semantic validation for training settings.
//!
//! Shape and types are checked by serde; this checks that the values make
//! sense for a training run.

use thiserror::Error;

use super::training::TrainingConfig;

/// Errors from semantic validation.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("max_iterations must be at least 1 (got {value})")]
    MaxIterationsZero { value: usize },

    #[error("tolerance must be a finite positive number (got {value})")]
    ToleranceRange { value: f64 },
}

/// Validate training settings semantically.
pub fn validate_training(config: &TrainingConfig) -> Result<(), ValidationError> {
    if config.max_iterations == 0 {
        return Err(ValidationError::MaxIterationsZero {
            value: config.max_iterations,
        });
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(ValidationError::ToleranceRange {
            value: config.tolerance,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_training(&TrainingConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_iterations() {
        let config = TrainingConfig {
            max_iterations: 0,
            ..TrainingConfig::default()
        };
        assert_eq!(
            validate_training(&config),
            Err(ValidationError::MaxIterationsZero { value: 0 })
        );
    }

    #[test]
    fn test_bad_tolerance() {
        for value in [0.0, -1e-6, f64::INFINITY] {
            let config = TrainingConfig {
                tolerance: value,
                ..TrainingConfig::default()
            };
            assert!(matches!(
                validate_training(&config),
                Err(ValidationError::ToleranceRange { .. })
            ));
        }
        let config = TrainingConfig {
            tolerance: f64::NAN,
            ..TrainingConfig::default()
        };
        assert!(validate_training(&config).is_err());
    }
}
