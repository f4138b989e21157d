//! Error types for the hmm CLI.
//!
//! Library crates keep their own precise error enums. This module folds them
//! into one type carrying:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation suggestions for humans
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 20,
//!   "category": "model",
//!   "message": "invalid model: transition row 1 sums to 0.9, expected 1.0",
//!   "recoverable": true
//! }
//! ```

use hmm_math::ContainerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for hmm CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Training settings file errors.
    Config,
    /// Malformed model tables or emission sequences.
    Model,
    /// Numerical failures inside the algorithms.
    Inference,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Inference => write!(f, "inference"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the hmm CLI.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid training settings: {0}")]
    InvalidSettings(String),

    // Model errors (20-29)
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid emission sequence: {0}")]
    InvalidSequence(String),

    #[error("malformed container: {0}")]
    Container(#[from] ContainerError),

    // Inference errors (30-39)
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("degenerate model: {0}")]
    DegenerateModel(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Model errors
    /// - 30-39: Inference errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidSettings(_) => 11,
            Error::InvalidModel(_) => 20,
            Error::InvalidSequence(_) => 21,
            Error::Container(ContainerError::ShapeMismatch { .. }) => 22,
            Error::Container(ContainerError::UnsupportedRank(_)) => 23,
            Error::Container(_) => 24,
            Error::Inference(_) => 30,
            Error::DegenerateModel(_) => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidSettings(_) => ErrorCategory::Config,

            Error::InvalidModel(_) | Error::InvalidSequence(_) | Error::Container(_) => {
                ErrorCategory::Model
            }

            Error::Inference(_) | Error::DegenerateModel(_) => ErrorCategory::Inference,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Nothing here is transient: every failure is an input problem, so
    /// "recoverable" means the caller can fix the input and rerun.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidSettings(_) => true,
            Error::InvalidModel(_) | Error::InvalidSequence(_) | Error::Container(_) => true,
            Error::Inference(_) => true,
            // More data or a different starting model usually helps
            Error::DegenerateModel(_) => true,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Check the --config path or HMM_CONFIG_DIR and the JSON syntax.",
            Error::InvalidSettings(_) => {
                "max_iterations must be positive and tolerance a positive finite number."
            }
            Error::InvalidModel(_) => {
                "Every table row must be a probability distribution. Run 'hmm check --model <dir>'."
            }
            Error::InvalidSequence(_) => {
                "Emission symbols must be integers in [0, num_emissions) and the sequence non-empty."
            }
            Error::Container(_) => {
                "The header counts must match the number of values: '<N> v..' or '<R> <C> v..'."
            }
            Error::Inference(_) => {
                "The sequence has zero probability under the model. Check for symbols no reachable state emits."
            }
            Error::DegenerateModel(_) => {
                "A state received no occupancy. Use a longer sequence or re-initialize with 'hmm init'."
            }
            Error::Io(_) => "Check that the files exist and are readable/writable.",
            Error::Json(_) => "Invalid JSON. Check the file syntax.",
        }
    }

    /// Structured form for JSON output on stderr/stdout.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code(),
            "category": self.category(),
            "message": self.to_string(),
            "recoverable": self.is_recoverable(),
            "remediation": self.remediation(),
        })
    }
}
