//! Forward pass and likelihood evaluation.
//!
//! `alpha[0][s] = initial[s] * B[s][o_0]`
//! `alpha[t][s] = (Σ_from alpha[t-1][from] * A[from][s]) * B[s][o_t]`
//!
//! The scaled variant divides each row by its sum as it goes and records
//! the reciprocal, so long sequences stay representable.

use super::error::HmmError;
use super::model::Hmm;
use hmm_math::scale_in_place;
use serde::{Deserialize, Serialize};

/// Output of the scaled forward pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledForward {
    /// Alpha rows, each normalized to sum to one.
    pub alphas: Vec<Vec<f64>>,
    /// `scaling_factors[t]` = 1 / (sum of the raw alpha row at `t`).
    pub scaling_factors: Vec<f64>,
}

impl Hmm {
    /// Unscaled alpha table, one row per time step.
    pub fn forward_pass(&self, emission_sequence: &[usize]) -> Result<Vec<Vec<f64>>, HmmError> {
        self.check_sequence(emission_sequence)?;

        let mut alphas = Vec::with_capacity(emission_sequence.len());
        alphas.push(self.initial_row(emission_sequence[0]));
        for &symbol in &emission_sequence[1..] {
            let next = self.forward_step(&alphas[alphas.len() - 1], symbol);
            alphas.push(next);
        }
        Ok(alphas)
    }

    /// Scaled alpha table plus the per-step scaling factors.
    ///
    /// Fails with [`HmmError::ImpossibleSequence`] when a raw alpha row sums
    /// to zero, since it cannot be rescaled.
    pub fn scaled_forward_pass(&self, emission_sequence: &[usize]) -> Result<ScaledForward, HmmError> {
        self.check_sequence(emission_sequence)?;

        let len = emission_sequence.len();
        let mut alphas: Vec<Vec<f64>> = Vec::with_capacity(len);
        let mut scaling_factors = Vec::with_capacity(len);

        for (time, &symbol) in emission_sequence.iter().enumerate() {
            let mut row = match alphas.last() {
                None => self.initial_row(symbol),
                Some(prev) => self.forward_step(prev, symbol),
            };
            let sum: f64 = row.iter().sum();
            if sum.is_nan() || sum <= 0.0 {
                return Err(HmmError::ImpossibleSequence { time });
            }
            let factor = 1.0 / sum;
            scale_in_place(&mut row, factor);
            scaling_factors.push(factor);
            alphas.push(row);
        }

        Ok(ScaledForward {
            alphas,
            scaling_factors,
        })
    }

    /// Probability that the model produced `emission_sequence`.
    ///
    /// Sum of the last unscaled alpha row. Underflows to zero for long
    /// sequences; use [`Hmm::log_emissions_probability`] there.
    pub fn emissions_probability(&self, emission_sequence: &[usize]) -> Result<f64, HmmError> {
        let alphas = self.forward_pass(emission_sequence)?;
        Ok(alphas.last().map_or(0.0, |row| row.iter().sum()))
    }

    /// Natural log of [`Hmm::emissions_probability`], computed from the
    /// scaling factors: `ln P = -Σ_t ln(scaling_factors[t])`.
    pub fn log_emissions_probability(&self, emission_sequence: &[usize]) -> Result<f64, HmmError> {
        let forward = self.scaled_forward_pass(emission_sequence)?;
        Ok(-forward.scaling_factors.iter().map(|c| c.ln()).sum::<f64>())
    }

    fn forward_step(&self, prev: &[f64], symbol: usize) -> Vec<f64> {
        self.propagate(prev)
            .into_iter()
            .zip(self.emission_probabilities())
            .map(|(prior, emit)| prior * emit[symbol])
            .collect()
    }
}
