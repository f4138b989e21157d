//! Errors from the HMM engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The three probability tables of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Initial,
    Transition,
    Emission,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Initial => "initial",
            Table::Transition => "transition",
            Table::Emission => "emission",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors from model construction and the HMM algorithms.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HmmError {
    #[error("model has no states")]
    NoStates,

    #[error("model has no emission symbols")]
    NoEmissions,

    #[error("{table} table has {actual} entries along an axis, expected {expected}")]
    DimensionMismatch {
        table: Table,
        expected: usize,
        actual: usize,
    },

    #[error("{table}[{row}][{col}] = {value} is not a probability")]
    InvalidProbability {
        table: Table,
        row: usize,
        col: usize,
        value: f64,
    },

    #[error("{table} row {row} sums to {sum}, expected 1.0")]
    NotStochastic { table: Table, row: usize, sum: f64 },

    #[error("emission sequence is empty")]
    EmptySequence,

    #[error("symbol {symbol} at time {time} is outside [0, {num_emissions})")]
    SymbolOutOfRange {
        time: usize,
        symbol: usize,
        num_emissions: usize,
    },

    #[error("got {actual} scaling factors for a sequence of length {expected}")]
    ScalingLengthMismatch { expected: usize, actual: usize },

    #[error("sequence has zero probability under the model (forward mass vanished at time {time})")]
    ImpossibleSequence { time: usize },

    #[error("state {state} has zero expected occupancy, cannot re-estimate {table} row")]
    DegenerateModel { table: Table, state: usize },
}

impl HmmError {
    /// Whether the error is about the emission sequence rather than the model.
    pub fn is_sequence_error(&self) -> bool {
        matches!(
            self,
            HmmError::EmptySequence
                | HmmError::SymbolOutOfRange { .. }
                | HmmError::ScalingLengthMismatch { .. }
        )
    }
}

impl From<HmmError> for hmm_common::Error {
    fn from(err: HmmError) -> Self {
        match err {
            HmmError::DegenerateModel { .. } => hmm_common::Error::DegenerateModel(err.to_string()),
            HmmError::ImpossibleSequence { .. } => hmm_common::Error::Inference(err.to_string()),
            ref e if e.is_sequence_error() => hmm_common::Error::InvalidSequence(err.to_string()),
            _ => hmm_common::Error::InvalidModel(err.to_string()),
        }
    }
}
