//! Baum-Welch training loop.
//!
//! `improve` performs one re-estimation step; this drives it until the
//! log-likelihood settles or the iteration budget runs out.

use serde::{Deserialize, Serialize};

use super::error::HmmError;
use super::model::Hmm;
use crate::logging::event_names;

/// Stopping rules for [`train`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainOptions {
    /// Maximum number of `improve` calls.
    pub max_iterations: usize,
    /// Converged once `|ΔlogL|` drops below this.
    pub tolerance: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Why [`train`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `|ΔlogL|` dropped below the tolerance.
    Converged,
    /// `max_iterations` improvements were applied.
    BudgetExhausted,
    /// The next re-estimated model gave the sequence zero probability and
    /// was discarded.
    SequenceImpossible,
}

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    /// The last re-estimated model.
    pub model: Hmm,
    /// Number of `improve` calls applied.
    pub iterations: usize,
    pub converged: bool,
    pub stop_reason: StopReason,
    pub initial_log_likelihood: f64,
    pub final_log_likelihood: f64,
    /// Log-likelihood after each iteration.
    pub history: Vec<f64>,
}

/// Re-estimate `initial` on `emission_sequence` until convergence.
///
/// A likelihood drop larger than the tolerance is logged as a warning but
/// does not stop training. Re-estimation ignores the final step's emission,
/// so a symbol seen only there can vanish from the next model; that model
/// is discarded and the last one that explains the sequence is returned
/// with [`StopReason::SequenceImpossible`].
pub fn train(
    initial: &Hmm,
    emission_sequence: &[usize],
    options: &TrainOptions,
) -> Result<TrainReport, HmmError> {
    let initial_log_likelihood = initial.log_emissions_probability(emission_sequence)?;
    tracing::info!(
        target: event_names::TRAIN_STARTED,
        num_states = initial.num_states() as u64,
        num_emissions = initial.num_emissions() as u64,
        sequence_len = emission_sequence.len() as u64,
        max_iterations = options.max_iterations as u64,
        log_likelihood = initial_log_likelihood,
        message = "starting Baum-Welch training"
    );

    let mut model = initial.clone();
    let mut previous = initial_log_likelihood;
    let mut history = Vec::new();
    let mut stop_reason = StopReason::BudgetExhausted;

    while history.len() < options.max_iterations {
        let candidate = model.improve(emission_sequence)?;
        let current = match candidate.log_emissions_probability(emission_sequence) {
            Ok(current) => current,
            Err(HmmError::ImpossibleSequence { time }) => {
                tracing::warn!(
                    target: event_names::TRAIN_SEQUENCE_IMPOSSIBLE,
                    iteration = (history.len() + 1) as u64,
                    time = time as u64,
                    message = "re-estimated model cannot produce the sequence, keeping previous model"
                );
                stop_reason = StopReason::SequenceImpossible;
                break;
            }
            Err(err) => return Err(err),
        };
        model = candidate;
        history.push(current);

        let delta = current - previous;
        tracing::debug!(
            target: event_names::TRAIN_ITERATION,
            iteration = history.len() as u64,
            log_likelihood = current,
            delta = delta,
            message = "re-estimated model"
        );
        if delta < -options.tolerance {
            tracing::warn!(
                target: event_names::TRAIN_LIKELIHOOD_DECREASED,
                iteration = history.len() as u64,
                delta = delta,
                message = "log-likelihood decreased after re-estimation"
            );
        }

        previous = current;
        if delta.abs() < options.tolerance {
            stop_reason = StopReason::Converged;
            break;
        }
    }

    let converged = stop_reason == StopReason::Converged;

    let iterations = history.len();
    tracing::info!(
        target: event_names::TRAIN_FINISHED,
        iterations = iterations as u64,
        converged = converged,
        stop_reason = ?stop_reason,
        initial_log_likelihood = initial_log_likelihood,
        final_log_likelihood = previous,
        message = "training finished"
    );

    Ok(TrainReport {
        model,
        iterations,
        converged,
        stop_reason,
        initial_log_likelihood,
        final_log_likelihood: previous,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::fixtures::weather;

    fn training_sequence() -> Vec<usize> {
        vec![0, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0]
    }

    #[test]
    fn test_converges_within_budget() {
        let report = train(&weather(), &training_sequence(), &TrainOptions::default()).unwrap();
        assert!(report.converged);
        assert!(report.iterations <= 100);
        assert_eq!(report.history.len(), report.iterations);
        assert_eq!(report.final_log_likelihood, *report.history.last().unwrap());
        assert!(report.final_log_likelihood >= report.initial_log_likelihood);
        assert!(report.model.validate().is_ok());
    }

    #[test]
    fn test_budget_exhausted() {
        let options = TrainOptions {
            max_iterations: 2,
            tolerance: 1e-300,
        };
        let report = train(&weather(), &training_sequence(), &options).unwrap();
        assert!(!report.converged);
        assert_eq!(report.stop_reason, StopReason::BudgetExhausted);
        assert_eq!(report.iterations, 2);
    }

    #[test]
    fn test_matches_manual_improve() {
        let options = TrainOptions {
            max_iterations: 3,
            tolerance: 1e-300,
        };
        let seq = training_sequence();
        let report = train(&weather(), &seq, &options).unwrap();

        let mut manual = weather();
        for _ in 0..3 {
            manual = manual.improve(&seq).unwrap();
        }
        assert_eq!(report.model, manual);
    }

    #[test]
    fn test_zero_budget_returns_input() {
        let options = TrainOptions {
            max_iterations: 0,
            tolerance: 1e-6,
        };
        let report = train(&weather(), &training_sequence(), &options).unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(report.model, weather());
        assert_eq!(report.initial_log_likelihood, report.final_log_likelihood);
    }

    #[test]
    fn test_symbol_only_at_final_step_keeps_last_good_model() {
        let seq = [0, 0, 0, 1];
        assert!(matches!(
            weather()
                .improve(&seq)
                .unwrap()
                .log_emissions_probability(&seq),
            Err(HmmError::ImpossibleSequence { time: 3 })
        ));

        let report = train(&weather(), &seq, &TrainOptions::default()).unwrap();
        assert!(!report.converged);
        assert_eq!(report.stop_reason, StopReason::SequenceImpossible);
        assert_eq!(report.iterations, 0);
        assert!(report.history.is_empty());
        assert_eq!(report.model, weather());
        assert_eq!(report.final_log_likelihood, report.initial_log_likelihood);
        assert!(report.final_log_likelihood.is_finite());
    }

    #[test]
    fn test_propagates_degenerate_model() {
        let err = train(&weather(), &[1], &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, HmmError::DegenerateModel { .. }));
    }
}
