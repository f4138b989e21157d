//! Fuzz target for the JSON form of a model.
//!
//! Deserialization goes through the same validation as `Hmm::new`, so
//! anything accepted here must be row-stochastic.

#![no_main]

use hmm_core::inference::Hmm;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(hmm) = serde_json::from_slice::<Hmm>(data) {
        assert!(hmm.validate().is_ok());
    }
});
