//! Fuzz target for 1-D container parsing.
//!
//! Arbitrary text must parse or fail cleanly, and anything that parses must
//! re-encode to text that parses back to the same values.

#![no_main]

use hmm_math::{parse_vector, vector_to_text};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = parse_vector::<f64>(data);

    if let Ok(symbols) = parse_vector::<usize>(data) {
        let text = vector_to_text(&symbols);
        assert_eq!(parse_vector::<usize>(&text).ok(), Some(symbols));
    }
});
