//! Fuzz target for 2-D container parsing.

#![no_main]

use hmm_math::{matrix_to_text, parse_matrix};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(matrix) = parse_matrix::<f64>(data) {
        // Parsed matrices are rectangular, so encoding cannot fail.
        let _ = matrix_to_text(&matrix).expect("parsed matrix is rectangular");
    }
});
