//! The HMM value type and its invariants.
//!
//! A model is three row-stochastic tables:
//!
//! - `initial_distribution[s]`: P(state at time 0 = s)
//! - `transition_probabilities[i][j]`: P(next state = j | current state = i)
//! - `emission_probabilities[s][e]`: P(symbol = e | state = s)
//!
//! Models are never mutated; re-estimation returns a fresh value.

use super::error::{HmmError, Table};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Allowed deviation of a row sum from 1.0.
pub const STOCHASTIC_TOLERANCE: f64 = 1e-6;

/// Plain table form of a model, used for (de)serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmmTables {
    pub initial_distribution: Vec<f64>,
    pub transition_probabilities: Vec<Vec<f64>>,
    pub emission_probabilities: Vec<Vec<f64>>,
}

/// Hidden Markov model over a discrete emission alphabet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HmmTables", into = "HmmTables")]
pub struct Hmm {
    initial_distribution: Vec<f64>,
    transition_probabilities: Vec<Vec<f64>>,
    emission_probabilities: Vec<Vec<f64>>,
}

impl Hmm {
    /// Build a model, checking shapes and row-stochasticity.
    pub fn new(
        initial_distribution: Vec<f64>,
        transition_probabilities: Vec<Vec<f64>>,
        emission_probabilities: Vec<Vec<f64>>,
    ) -> Result<Self, HmmError> {
        let hmm = Self::from_tables_unchecked(
            initial_distribution,
            transition_probabilities,
            emission_probabilities,
        );
        hmm.validate()?;
        Ok(hmm)
    }

    /// Build a model whose shapes are consistent by construction.
    pub(crate) fn from_tables_unchecked(
        initial_distribution: Vec<f64>,
        transition_probabilities: Vec<Vec<f64>>,
        emission_probabilities: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            initial_distribution,
            transition_probabilities,
            emission_probabilities,
        }
    }

    /// Every state equally likely everywhere.
    pub fn uniform(num_states: usize, num_emissions: usize) -> Result<Self, HmmError> {
        check_sizes(num_states, num_emissions)?;
        let state_p = 1.0 / num_states as f64;
        let emit_p = 1.0 / num_emissions as f64;
        Self::new(
            vec![state_p; num_states],
            vec![vec![state_p; num_states]; num_states],
            vec![vec![emit_p; num_emissions]; num_states],
        )
    }

    /// Random row-stochastic tables, a common starting point for training.
    ///
    /// Entries are drawn from `[0.1, 1.0)` before normalization so that no
    /// state or symbol starts with zero mass.
    pub fn random<R: Rng + ?Sized>(
        num_states: usize,
        num_emissions: usize,
        rng: &mut R,
    ) -> Result<Self, HmmError> {
        check_sizes(num_states, num_emissions)?;
        let initial = random_row(num_states, rng);
        let transitions = (0..num_states).map(|_| random_row(num_states, rng)).collect();
        let emissions = (0..num_states)
            .map(|_| random_row(num_emissions, rng))
            .collect();
        Self::new(initial, transitions, emissions)
    }

    pub fn num_states(&self) -> usize {
        self.initial_distribution.len()
    }

    pub fn num_emissions(&self) -> usize {
        self.emission_probabilities.first().map_or(0, Vec::len)
    }

    pub fn initial_distribution(&self) -> &[f64] {
        &self.initial_distribution
    }

    pub fn transition_probabilities(&self) -> &[Vec<f64>] {
        &self.transition_probabilities
    }

    pub fn emission_probabilities(&self) -> &[Vec<f64>] {
        &self.emission_probabilities
    }

    /// Consume the model, returning its tables.
    pub fn into_tables(self) -> HmmTables {
        HmmTables {
            initial_distribution: self.initial_distribution,
            transition_probabilities: self.transition_probabilities,
            emission_probabilities: self.emission_probabilities,
        }
    }

    /// Check every model invariant.
    pub fn validate(&self) -> Result<(), HmmError> {
        let num_states = self.num_states();
        if num_states == 0 {
            return Err(HmmError::NoStates);
        }
        let num_emissions = self.num_emissions();
        if num_emissions == 0 {
            return Err(HmmError::NoEmissions);
        }

        check_row(Table::Initial, 0, &self.initial_distribution)?;
        check_matrix(
            Table::Transition,
            &self.transition_probabilities,
            num_states,
            num_states,
        )?;
        check_matrix(
            Table::Emission,
            &self.emission_probabilities,
            num_states,
            num_emissions,
        )?;
        Ok(())
    }

    /// Check that every symbol of `emission_sequence` belongs to the alphabet.
    pub fn check_sequence(&self, emission_sequence: &[usize]) -> Result<(), HmmError> {
        if emission_sequence.is_empty() {
            return Err(HmmError::EmptySequence);
        }
        let num_emissions = self.num_emissions();
        match emission_sequence
            .iter()
            .enumerate()
            .find(|(_, &symbol)| symbol >= num_emissions)
        {
            Some((time, &symbol)) => Err(HmmError::SymbolOutOfRange {
                time,
                symbol,
                num_emissions,
            }),
            None => Ok(()),
        }
    }

    /// Distribution over states after one transition from `state_distribution`.
    pub fn transition_step(&self, state_distribution: &[f64]) -> Result<Vec<f64>, HmmError> {
        if state_distribution.len() != self.num_states() {
            return Err(HmmError::DimensionMismatch {
                table: Table::Transition,
                expected: self.num_states(),
                actual: state_distribution.len(),
            });
        }
        Ok(self.propagate(state_distribution))
    }

    /// `Σ_from dist[from] * A[from][to]` for every `to`.
    pub(crate) fn propagate(&self, state_distribution: &[f64]) -> Vec<f64> {
        let mut next = vec![0.0; self.num_states()];
        for (p, row) in state_distribution
            .iter()
            .zip(&self.transition_probabilities)
        {
            for (n, a) in next.iter_mut().zip(row) {
                *n += p * a;
            }
        }
        next
    }

    /// First alpha/delta row: `initial[s] * B[s][symbol]`.
    pub(crate) fn initial_row(&self, symbol: usize) -> Vec<f64> {
        self.initial_distribution
            .iter()
            .zip(&self.emission_probabilities)
            .map(|(init, emit)| init * emit[symbol])
            .collect()
    }
}

impl TryFrom<HmmTables> for Hmm {
    type Error = HmmError;

    fn try_from(tables: HmmTables) -> Result<Self, Self::Error> {
        Hmm::new(
            tables.initial_distribution,
            tables.transition_probabilities,
            tables.emission_probabilities,
        )
    }
}

impl From<Hmm> for HmmTables {
    fn from(hmm: Hmm) -> Self {
        hmm.into_tables()
    }
}

fn check_sizes(num_states: usize, num_emissions: usize) -> Result<(), HmmError> {
    if num_states == 0 {
        return Err(HmmError::NoStates);
    }
    if num_emissions == 0 {
        return Err(HmmError::NoEmissions);
    }
    Ok(())
}

fn random_row<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f64> {
    let raw: Vec<f64> = (0..len).map(|_| rng.random_range(0.1..1.0)).collect();
    let sum: f64 = raw.iter().sum();
    hmm_math::vector_scalar_mult(&raw, 1.0 / sum)
}

fn check_matrix(
    table: Table,
    rows: &[Vec<f64>],
    expected_rows: usize,
    expected_cols: usize,
) -> Result<(), HmmError> {
    if rows.len() != expected_rows {
        return Err(HmmError::DimensionMismatch {
            table,
            expected: expected_rows,
            actual: rows.len(),
        });
    }
    for (r, row) in rows.iter().enumerate() {
        if row.len() != expected_cols {
            return Err(HmmError::DimensionMismatch {
                table,
                expected: expected_cols,
                actual: row.len(),
            });
        }
        check_row(table, r, row)?;
    }
    Ok(())
}

fn check_row(table: Table, row: usize, values: &[f64]) -> Result<(), HmmError> {
    if let Some((col, &value)) = values
        .iter()
        .enumerate()
        .find(|(_, &p)| !p.is_finite() || p < 0.0)
    {
        return Err(HmmError::InvalidProbability {
            table,
            row,
            col,
            value,
        });
    }
    let sum: f64 = values.iter().sum();
    if (sum - 1.0).abs() > STOCHASTIC_TOLERANCE {
        return Err(HmmError::NotStochastic { table, row, sum });
    }
    Ok(())
}
