//! Baum-Welch parameter re-estimation.
//!
//! One `improve` call is one EM step:
//!
//! - `initial' = gamma[0]`
//! - `A'[i][j] = Σ_{t<T-1} di_gamma[t][i][j] / Σ_{t<T-1} gamma[t][i]`
//! - `B'[s][e] = Σ_{t<T-1, o_t=e} gamma[t][s] / Σ_{t<T-1} gamma[t][s]`
//!
//! Both sums stop before the final time step. For emissions this leaves the
//! last observation out of the evidence pool; every re-estimated row still
//! sums to one because numerator and denominator range over the same steps.

use super::error::{HmmError, Table};
use super::gammas::Gammas;
use super::model::Hmm;

impl Hmm {
    /// A new model re-estimated from `emission_sequence`.
    ///
    /// Fails with [`HmmError::DegenerateModel`] when some state has zero
    /// expected occupancy over the first T-1 steps (always the case for a
    /// single-symbol sequence), instead of producing NaN rows.
    pub fn improve(&self, emission_sequence: &[usize]) -> Result<Hmm, HmmError> {
        let Gammas { gamma, di_gamma } = self.gammas(emission_sequence)?;

        let num_states = self.num_states();
        let num_emissions = self.num_emissions();
        let evidence = &gamma[..gamma.len() - 1];

        let mut occupancy = vec![0.0; num_states];
        for moment in evidence {
            for (total, g) in occupancy.iter_mut().zip(moment) {
                *total += g;
            }
        }

        let mut transition_probabilities = vec![vec![0.0; num_states]; num_states];
        for (from, row) in transition_probabilities.iter_mut().enumerate() {
            let denominator = occupancy[from];
            if denominator <= 0.0 || denominator.is_nan() {
                return Err(HmmError::DegenerateModel {
                    table: Table::Transition,
                    state: from,
                });
            }
            for moment in &di_gamma {
                for (cell, d) in row.iter_mut().zip(&moment[from]) {
                    *cell += d;
                }
            }
            for cell in row.iter_mut() {
                *cell /= denominator;
            }
        }

        let mut emission_probabilities = vec![vec![0.0; num_emissions]; num_states];
        for (moment, &symbol) in evidence.iter().zip(emission_sequence) {
            for (row, g) in emission_probabilities.iter_mut().zip(moment) {
                row[symbol] += g;
            }
        }
        for (state, row) in emission_probabilities.iter_mut().enumerate() {
            let denominator = occupancy[state];
            if denominator <= 0.0 || denominator.is_nan() {
                return Err(HmmError::DegenerateModel {
                    table: Table::Emission,
                    state,
                });
            }
            for cell in row.iter_mut() {
                *cell /= denominator;
            }
        }

        let initial_distribution = gamma.into_iter().next().unwrap_or_default();

        Ok(Hmm::from_tables_unchecked(
            initial_distribution,
            transition_probabilities,
            emission_probabilities,
        ))
    }
}
