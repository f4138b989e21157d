//! Drawing hidden paths and emissions from a model.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::HmmError;
use super::model::Hmm;

/// A sampled hidden path and the symbols it emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub states: Vec<usize>,
    pub emissions: Vec<usize>,
}

impl Hmm {
    /// Draw `len` steps from the generative process.
    pub fn sample<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Result<Sample, HmmError> {
        if len == 0 {
            return Err(HmmError::EmptySequence);
        }

        let transitions = self.transition_probabilities();
        let emissions = self.emission_probabilities();

        let mut states = Vec::with_capacity(len);
        let mut symbols = Vec::with_capacity(len);

        let mut state = draw(self.initial_distribution(), rng);
        for time in 0..len {
            if time > 0 {
                state = draw(&transitions[state], rng);
            }
            states.push(state);
            symbols.push(draw(&emissions[state], rng));
        }

        Ok(Sample {
            states,
            emissions: symbols,
        })
    }
}

/// Inverse-CDF draw from a probability row.
///
/// Rounding can leave the cumulative sum just under the uniform draw; the
/// last index with positive mass absorbs that remainder.
fn draw<R: Rng + ?Sized>(row: &[f64], rng: &mut R) -> usize {
    let u: f64 = rng.random();
    let mut cumulative = 0.0;
    for (index, &p) in row.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return index;
        }
    }
    row.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}
