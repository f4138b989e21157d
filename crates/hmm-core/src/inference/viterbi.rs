//! Most probable hidden state sequence (Viterbi decoding).
//!
//! `delta[0][s] = initial[s] * B[s][o_0]`
//! `delta[t][s] = max_p(delta[t-1][p] * A[p][s]) * B[s][o_t]`
//!
//! Ties go to the lowest state index, both in the recursion and at
//! termination, so decoding is deterministic. No scaling is applied:
//! deltas carry absolute path probabilities and can underflow to zero on
//! long sequences, at which point every candidate ties and the path
//! degenerates toward state 0.

use super::error::HmmError;
use super::model::Hmm;
use hmm_math::argmax;

impl Hmm {
    /// Most likely state path for `emission_sequence`, one state per symbol.
    pub fn most_probable_states(&self, emission_sequence: &[usize]) -> Result<Vec<usize>, HmmError> {
        self.check_sequence(emission_sequence)?;

        let num_states = self.num_states();
        let len = emission_sequence.len();
        let transitions = self.transition_probabilities();
        let emissions = self.emission_probabilities();

        let mut deltas = self.initial_row(emission_sequence[0]);
        // back_pointers[t - 1][s]: best predecessor of state s at time t
        let mut back_pointers: Vec<Vec<usize>> = Vec::with_capacity(len - 1);
        let mut candidates = vec![0.0; num_states];

        for &symbol in &emission_sequence[1..] {
            let mut next = Vec::with_capacity(num_states);
            let mut pointers = Vec::with_capacity(num_states);
            for state in 0..num_states {
                for (prev, candidate) in candidates.iter_mut().enumerate() {
                    *candidate = deltas[prev] * transitions[prev][state];
                }
                let best_prev = argmax(&candidates).unwrap_or(0);
                pointers.push(best_prev);
                next.push(candidates[best_prev] * emissions[state][symbol]);
            }
            back_pointers.push(pointers);
            deltas = next;
        }

        // Fill the path back to front into a buffer sized up front.
        let mut path = vec![0usize; len];
        path[len - 1] = argmax(&deltas).unwrap_or(0);
        for time in (1..len).rev() {
            path[time - 1] = back_pointers[time - 1][path[time]];
        }
        Ok(path)
    }
}
