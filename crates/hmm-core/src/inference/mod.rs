//! Discrete hidden Markov model engine.
//!
//! An [`Hmm`] is an immutable value; every algorithm is a method taking an
//! emission sequence of symbol indices:
//!
//! - forward and backward passes, raw and scaled
//! - sequence likelihood
//! - state and transition posteriors (gamma / di-gamma)
//! - Viterbi decoding
//! - Baum-Welch re-estimation, and [`train`] to iterate it

pub mod backward;
pub mod error;
pub mod forward;
pub mod gammas;
pub mod model;
pub mod reestimate;
pub mod sample;
pub mod train;
pub mod viterbi;

pub use error::{HmmError, Table};
pub use forward::ScaledForward;
pub use gammas::Gammas;
pub use model::{Hmm, HmmTables, STOCHASTIC_TOLERANCE};
pub use sample::Sample;
pub use train::{train, StopReason, TrainOptions, TrainReport};

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Hmm;

    /// Two-state weather model shared by the unit tests.
    pub fn weather() -> Hmm {
        Hmm::new(
            vec![0.5, 0.5],
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.9, 0.1], vec![0.2, 0.8]],
        )
        .unwrap()
    }
}
