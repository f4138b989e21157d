//! Fuzz target for building a model from three table files and running
//! inference on it.
//!
//! Validation must reject bad tables with an error, and every pass over a
//! validated model must return rather than panic.

#![no_main]

use arbitrary::Arbitrary;
use hmm_core::inference::Hmm;
use hmm_math::{parse_matrix, parse_vector};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    initial: &'a str,
    transition: &'a str,
    emission: &'a str,
    sequence: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let (Ok(initial), Ok(transition), Ok(emission)) = (
        parse_vector::<f64>(input.initial),
        parse_matrix::<f64>(input.transition),
        parse_matrix::<f64>(input.emission),
    ) else {
        return;
    };
    let Ok(hmm) = Hmm::new(initial, transition, emission) else {
        return;
    };

    let sequence: Vec<usize> = input.sequence.iter().take(64).map(|&s| s as usize).collect();
    let _ = hmm.forward_pass(&sequence);
    let _ = hmm.log_emissions_probability(&sequence);
    let _ = hmm.most_probable_states(&sequence);
    let _ = hmm.gammas(&sequence);
    let _ = hmm.improve(&sequence);
});
