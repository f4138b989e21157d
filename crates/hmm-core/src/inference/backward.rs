//! Backward pass.
//!
//! `beta[T-1][s] = c[T-1]` (1 when unscaled)
//! `beta[t][from] = Σ_to A[from][to] * B[to][o_{t+1}] * beta[t+1][to] * c[t]`
//!
//! Scaled and unscaled variants are separate entry points so the presence
//! of scaling factors never silently changes what a caller gets back.

use super::error::HmmError;
use super::model::Hmm;

impl Hmm {
    /// Unscaled beta table, one row per time step.
    pub fn backward_pass(&self, emission_sequence: &[usize]) -> Result<Vec<Vec<f64>>, HmmError> {
        self.check_sequence(emission_sequence)?;
        Ok(self.backward_with(emission_sequence, |_| 1.0))
    }

    /// Beta table scaled with the factors of a prior scaled forward pass.
    pub fn scaled_backward_pass(
        &self,
        emission_sequence: &[usize],
        scaling_factors: &[f64],
    ) -> Result<Vec<Vec<f64>>, HmmError> {
        self.check_sequence(emission_sequence)?;
        if scaling_factors.len() != emission_sequence.len() {
            return Err(HmmError::ScalingLengthMismatch {
                expected: emission_sequence.len(),
                actual: scaling_factors.len(),
            });
        }
        Ok(self.backward_with(emission_sequence, |t| scaling_factors[t]))
    }

    /// Shared recursion; `factor(t)` is the multiplier applied at step `t`.
    pub(crate) fn backward_with<F>(&self, emission_sequence: &[usize], factor: F) -> Vec<Vec<f64>>
    where
        F: Fn(usize) -> f64,
    {
        let num_states = self.num_states();
        let len = emission_sequence.len();
        let transitions = self.transition_probabilities();
        let emissions = self.emission_probabilities();

        let mut betas = vec![vec![0.0; num_states]; len];
        betas[len - 1] = vec![factor(len - 1); num_states];

        for time in (0..len - 1).rev() {
            let next_symbol = emission_sequence[time + 1];
            let scale = factor(time);
            let (head, tail) = betas.split_at_mut(time + 1);
            let next = &tail[0];
            for (from, beta) in head[time].iter_mut().enumerate() {
                *beta = (0..num_states)
                    .map(|to| transitions[from][to] * emissions[to][next_symbol] * next[to] * scale)
                    .sum();
            }
        }
        betas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::fixtures::weather;

    #[test]
    fn test_backward_pass_by_hand() {
        let betas = weather().backward_pass(&[0, 0, 1]).unwrap();
        let expected = [[0.2265, 0.174], [0.31, 0.52], [1.0, 1.0]];
        for (row, exp) in betas.iter().zip(expected.iter()) {
            for (b, e) in row.iter().zip(exp.iter()) {
                assert!((b - e).abs() < 1e-12, "{b} vs {e}");
            }
        }
    }

    #[test]
    fn test_backward_agrees_with_forward_likelihood() {
        let hmm = weather();
        let seq = [1, 0, 0, 1, 1];
        let betas = hmm.backward_pass(&seq).unwrap();
        let via_backward: f64 = (0..hmm.num_states())
            .map(|s| {
                hmm.initial_distribution()[s] * hmm.emission_probabilities()[s][seq[0]] * betas[0][s]
            })
            .sum();
        let via_forward = hmm.emissions_probability(&seq).unwrap();
        assert!((via_backward - via_forward).abs() < 1e-12);
    }

    #[test]
    fn test_single_symbol() {
        let hmm = weather();
        assert_eq!(hmm.backward_pass(&[0]).unwrap(), vec![vec![1.0, 1.0]]);
        assert_eq!(
            hmm.scaled_backward_pass(&[0], &[2.5]).unwrap(),
            vec![vec![2.5, 2.5]]
        );
    }

    #[test]
    fn test_scaled_terminal_row_uses_last_factor() {
        let hmm = weather();
        let seq = [0, 1, 1];
        let forward = hmm.scaled_forward_pass(&seq).unwrap();
        let betas = hmm.scaled_backward_pass(&seq, &forward.scaling_factors).unwrap();
        assert_eq!(betas[2], vec![forward.scaling_factors[2]; 2]);
    }

    #[test]
    fn test_scaled_backward_equals_unscaled_times_suffix_product() {
        let hmm = weather();
        let seq = [0, 1, 1, 0];
        let forward = hmm.scaled_forward_pass(&seq).unwrap();
        let scaled = hmm.scaled_backward_pass(&seq, &forward.scaling_factors).unwrap();
        let raw = hmm.backward_pass(&seq).unwrap();
        for t in 0..seq.len() {
            let suffix: f64 = forward.scaling_factors[t..].iter().product();
            for s in 0..2 {
                let expected = raw[t][s] * suffix;
                assert!((scaled[t][s] - expected).abs() < 1e-9 * expected.abs().max(1.0));
            }
        }
    }

    #[test]
    fn test_scaling_length_checked() {
        let err = weather().scaled_backward_pass(&[0, 1], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            HmmError::ScalingLengthMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
