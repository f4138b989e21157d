//! State (gamma) and transition (di-gamma) occupancy probabilities.
//!
//! Computed from the scaled alpha and beta tables, so every product is
//! already a posterior probability:
//!
//! `di_gamma[t][i][j] = alpha[t][i] * A[i][j] * B[j][o_{t+1}] * beta[t+1][j]`
//! `gamma[t][i] = Σ_j di_gamma[t][i][j]`, and `gamma[T-1] = alpha[T-1]`.

use super::error::HmmError;
use super::forward::ScaledForward;
use super::model::Hmm;
use serde::{Deserialize, Serialize};

/// Occupancy tables for one emission sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gammas {
    /// `gamma[t][s]`, length T.
    pub gamma: Vec<Vec<f64>>,
    /// `di_gamma[t][from][to]`, length T-1.
    pub di_gamma: Vec<Vec<Vec<f64>>>,
}

impl Hmm {
    /// Gamma and di-gamma tables for `emission_sequence`.
    pub fn gammas(&self, emission_sequence: &[usize]) -> Result<Gammas, HmmError> {
        let ScaledForward {
            mut alphas,
            scaling_factors,
        } = self.scaled_forward_pass(emission_sequence)?;
        let betas = self.backward_with(emission_sequence, |t| scaling_factors[t]);

        let num_states = self.num_states();
        let len = emission_sequence.len();
        let transitions = self.transition_probabilities();
        let emissions = self.emission_probabilities();

        let mut gamma = Vec::with_capacity(len);
        let mut di_gamma = Vec::with_capacity(len - 1);

        for time in 0..len - 1 {
            let next_symbol = emission_sequence[time + 1];
            let mut moment = vec![vec![0.0; num_states]; num_states];
            let mut occupancy = vec![0.0; num_states];
            for (from, row) in moment.iter_mut().enumerate() {
                for (to, cell) in row.iter_mut().enumerate() {
                    *cell = alphas[time][from]
                        * transitions[from][to]
                        * emissions[to][next_symbol]
                        * betas[time + 1][to];
                }
                occupancy[from] = row.iter().sum();
            }
            gamma.push(occupancy);
            di_gamma.push(moment);
        }

        if let Some(last) = alphas.pop() {
            gamma.push(last);
        }

        Ok(Gammas { gamma, di_gamma })
    }

    /// Posterior state probabilities `P(state_t = s | observations)`.
    pub fn state_posteriors(&self, emission_sequence: &[usize]) -> Result<Vec<Vec<f64>>, HmmError> {
        Ok(self.gammas(emission_sequence)?.gamma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::fixtures::weather;

    #[test]
    fn test_shapes() {
        let g = weather().gammas(&[0, 0, 1, 0]).unwrap();
        assert_eq!(g.gamma.len(), 4);
        assert_eq!(g.di_gamma.len(), 3);
        assert!(g.di_gamma.iter().all(|m| m.len() == 2 && m.iter().all(|r| r.len() == 2)));
    }

    #[test]
    fn test_rows_are_distributions() {
        let g = weather().gammas(&[0, 1, 1, 0, 0, 1]).unwrap();
        for row in &g.gamma {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "sum={sum}");
        }
        for moment in &g.di_gamma {
            let sum: f64 = moment.iter().flatten().sum();
            assert!((sum - 1.0).abs() < 1e-9, "sum={sum}");
        }
    }

    #[test]
    fn test_matches_unscaled_posterior() {
        // gamma[t][s] = alpha[t][s] * beta[t][s] / P(O)
        let hmm = weather();
        let seq = [0, 0, 1];
        let g = hmm.gammas(&seq).unwrap();
        let alphas = hmm.forward_pass(&seq).unwrap();
        let betas = hmm.backward_pass(&seq).unwrap();
        let p = hmm.emissions_probability(&seq).unwrap();
        for t in 0..seq.len() {
            for s in 0..2 {
                let expected = alphas[t][s] * betas[t][s] / p;
                assert!((g.gamma[t][s] - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_single_symbol_has_no_di_gamma() {
        let g = weather().gammas(&[1]).unwrap();
        assert!(g.di_gamma.is_empty());
        assert_eq!(g.gamma.len(), 1);
        assert!((g.gamma[0][0] - 0.05 / 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_state_posteriors_is_gamma() {
        let hmm = weather();
        let seq = [1, 1, 0];
        assert_eq!(
            hmm.state_posteriors(&seq).unwrap(),
            hmm.gammas(&seq).unwrap().gamma
        );
    }
}
